//! CLI command for printing header details

use std::path::Path;

use crate::ops::ArkOperations;

pub fn execute(source: &Path, json: bool) -> anyhow::Result<()> {
    let info = ArkOperations::info(source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Header:     {}", info.header_path.display());
    println!("Version:    {}", info.version);
    match info.key {
        Some(key) => println!(
            "Encryption: key 0x{:08X}{}",
            key as u32,
            if info.xor { " + 0xFF xor" } else { "" }
        ),
        None => println!("Encryption: none"),
    }
    if info.broken_v4 {
        println!("Layout:     v4 with 32-bit part sizes");
    }
    println!("Entries:    {} ({} bytes)", info.entry_count, info.total_size);
    if info.hash_blocks > 0 {
        println!("Hash blocks: {}", info.hash_blocks);
    }
    if info.file_collections > 0 {
        println!("File collections: {}", info.file_collections);
    }

    if !info.parts.is_empty() {
        println!("Parts:");
        for (i, part) in info.parts.iter().enumerate() {
            println!(
                "  [{i}] {:>12}  {}{}",
                part.size,
                part.path.display(),
                if part.exists { "" } else { " (missing)" }
            );
        }
    }

    Ok(())
}
