//! CLI command for adding files to an existing archive

use std::path::Path;

use crate::cli::progress::simple_spinner;
use crate::ops::{ArkOperations, ArkPhase};

pub fn execute(archive: &Path, source: &Path, target: &str, quiet: bool) -> anyhow::Result<()> {
    let spinner = (!quiet).then(|| simple_spinner("Staging"));

    let added = ArkOperations::add_with_progress(archive, source, target, &|progress| {
        let Some(spinner) = &spinner else {
            return;
        };
        match progress.phase {
            ArkPhase::StagingFiles => {
                if let Some(name) = &progress.current_file {
                    spinner.set_message(format!("Staging {name}"));
                }
            }
            ArkPhase::Committing => spinner.set_message("Committing"),
            _ => {}
        }
    })?;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    println!("Added {added} file(s) to {}", archive.display());
    Ok(())
}
