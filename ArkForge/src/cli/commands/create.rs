//! CLI command for archive creation

use std::path::Path;
use std::time::Instant;

use crate::ark::ArkVersion;
use crate::cli::progress::{DISK, LOOKING_GLASS, print_done, print_step, short_name, simple_bar};
use crate::config::ArkConfig;
use crate::ops::{ArkOperations, ArkPhase};

pub fn execute(
    source: &Path,
    destination: &Path,
    version: Option<ArkVersion>,
    encrypt: bool,
    key: Option<i32>,
    quiet: bool,
    config: &ArkConfig,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let mut options = config.options(version, encrypt || key.is_some())?;
    if let Some(key) = key {
        options = options.with_key(key);
    }

    if !quiet {
        print_step(
            1,
            2,
            LOOKING_GLASS,
            &format!("Scanning {} for a {} archive", source.display(), options.version),
        );
    }

    let pb = simple_bar(0, "Staging", quiet);
    let archive = ArkOperations::create_with_progress(source, destination, &options, &|progress| {
        match progress.phase {
            ArkPhase::StagingFiles => {
                pb.set_length(progress.total as u64);
                pb.set_position(progress.current as u64);
                if let Some(name) = &progress.current_file {
                    pb.set_message(short_name(name).to_string());
                }
            }
            ArkPhase::Committing => {
                pb.finish_and_clear();
                if !quiet {
                    print_step(2, 2, DISK, &format!("Writing {} files", progress.total));
                }
            }
            _ => {}
        }
    })?;

    if !quiet {
        println!(
            "Created {} with {} entries in {} part(s)",
            archive.header_path().display(),
            archive.committed().len(),
            archive.part_count()
        );
        print_done(started.elapsed());
    }
    Ok(())
}
