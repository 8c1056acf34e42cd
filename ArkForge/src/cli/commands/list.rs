//! CLI command for listing archive contents

use std::path::Path;

use crate::ops::{ArkOperations, EntryInfo, matches_glob};

/// Format byte size for human-readable output
fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn execute(
    source: &Path,
    detailed: bool,
    filter: Option<&str>,
    count: bool,
    json: bool,
) -> anyhow::Result<()> {
    let entries: Vec<EntryInfo> = ArkOperations::list_detailed(source)?
        .into_iter()
        .filter(|e| filter.is_none_or(|pattern| matches_glob(pattern, &e.path)))
        .collect();

    if count {
        println!("{}", entries.len());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if !detailed {
        for entry in &entries {
            println!("{}", entry.path);
        }
        return Ok(());
    }

    println!("{:>10}  {:>4}  {:>12}  PATH", "SIZE", "PART", "OFFSET");
    for entry in &entries {
        let size = entry.size.map_or_else(|| "-".to_string(), |s| format_size(u64::from(s)));
        let part = entry.part.map_or_else(|| "-".to_string(), |p| p.to_string());
        let offset = entry.offset.map_or_else(|| "pending".to_string(), |o| format!("0x{o:X}"));
        println!("{size:>10}  {part:>4}  {offset:>12}  {}", entry.path);
    }

    let total: u64 = entries.iter().filter_map(|e| e.size).map(u64::from).sum();
    println!();
    println!("{} files, {} total", entries.len(), format_size(total));

    Ok(())
}
