//! CLI command for archive extraction

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{LOOKING_GLASS, PACKAGE, print_done, print_step, short_name, simple_bar};
use crate::ops::{ArkOperations, ArkPhase, matches_glob};

pub fn execute(
    source: &Path,
    destination: &Path,
    filter: Option<&str>,
    files: &[String],
    threads: Option<usize>,
    quiet: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    if !quiet {
        print_step(1, 2, LOOKING_GLASS, &format!("Reading {}", source.display()));
    }

    let selected: Option<Vec<String>> = if !files.is_empty() {
        Some(files.to_vec())
    } else if let Some(pattern) = filter {
        let matching: Vec<String> = ArkOperations::list(source)?
            .into_iter()
            .filter(|f| matches_glob(pattern, f))
            .collect();
        if matching.is_empty() {
            println!("No files match pattern: {pattern}");
            return Ok(());
        }
        Some(matching)
    } else {
        None
    };

    let total = match &selected {
        Some(files) => files.len(),
        None => ArkOperations::list(source)?.len(),
    };

    if !quiet {
        print_step(
            2,
            2,
            PACKAGE,
            &format!("Extracting {total} files to {}", destination.display()),
        );
    }

    let pb = simple_bar(total as u64, "Extracting", quiet);
    ArkOperations::extract_parallel(
        source,
        destination,
        selected.as_deref(),
        threads,
        &|progress| {
            if progress.phase != ArkPhase::ExtractingFiles {
                return;
            }
            pb.inc(1);
            if let Some(name) = &progress.current_file {
                pb.set_message(short_name(name).to_string());
            }
        },
    )?;
    pb.finish_with_message("done");

    if !quiet {
        print_done(started.elapsed());
    }
    Ok(())
}
