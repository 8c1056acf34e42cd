//! CLI commands for header encryption

use std::path::Path;

use crate::cli::progress::{LOCK, print_step};
use crate::ops::ArkOperations;

pub fn decrypt(input: &Path, output: &Path) -> anyhow::Result<()> {
    let encryption = ArkOperations::decrypt_header(input, output)?;
    println!(
        "Decrypted {} (key 0x{:08X}{}) to {}",
        input.display(),
        encryption.key as u32,
        if encryption.xor { ", xor" } else { "" },
        output.display()
    );
    Ok(())
}

pub fn encrypt(input: &Path, output: &Path, key: i32) -> anyhow::Result<()> {
    print_step(1, 1, LOCK, &format!("Encrypting {}", input.display()));
    let encryption = ArkOperations::encrypt_header(input, output, key)?;
    println!(
        "Wrote {} (key 0x{:08X}{})",
        output.display(),
        encryption.key as u32,
        if encryption.xor { ", xor" } else { "" }
    );
    Ok(())
}
