use clap::Subcommand;
use std::path::PathBuf;

use crate::ark::ArkVersion;

pub mod add;
pub mod config;
pub mod create;
pub mod crypt;
mod execute;
pub mod extract;
pub mod info;
pub mod list;

/// Parse a header version number (2-10)
fn parse_version(s: &str) -> Result<ArkVersion, String> {
    let raw: i32 = s
        .trim_start_matches(['v', 'V'])
        .parse()
        .map_err(|_| format!("Invalid version '{s}'"))?;
    ArkVersion::from_raw(raw).ok_or_else(|| format!("Unsupported version '{s}'. Valid values: 2-10"))
}

/// Parse a cipher key as `0x`-prefixed hex or signed decimal
pub(crate) fn parse_key(s: &str) -> Result<i32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).map(|v| v as i32),
        None => s.parse::<i32>(),
    };
    parsed.map_err(|_| format!("Invalid key '{s}'. Use hex (0x295E2D5E) or decimal"))
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the contents of an archive or loose directory
    List {
        /// Header file, data part, single-file .ark or directory
        source: PathBuf,

        /// Show sizes and part locations
        #[arg(short = 'l', long)]
        detailed: bool,

        /// Only list entries matching a glob pattern (e.g., "*.mid")
        #[arg(long)]
        filter: Option<String>,

        /// Only print the number of matching entries
        #[arg(long)]
        count: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show header details of an archive
    Info {
        /// Header file or data part
        source: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Extract entries from an archive
    Extract {
        /// Source archive
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Only extract entries matching a glob pattern
        #[arg(long, conflicts_with = "file")]
        filter: Option<String>,

        /// Extract only this entry path (repeatable)
        #[arg(long)]
        file: Vec<String>,

        /// Worker threads (defaults to the config value, then all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Create a new archive from a directory
    Create {
        /// Directory to pack
        #[arg(short, long)]
        source: PathBuf,

        /// Header file to create (data parts are written next to it)
        #[arg(short, long)]
        destination: PathBuf,

        /// Header version (2-10), defaults to the config value
        #[arg(short = 'V', long, value_parser = parse_version)]
        version: Option<ArkVersion>,

        /// Encrypt the header
        #[arg(short, long)]
        encrypt: bool,

        /// Cipher key (implies --encrypt)
        #[arg(short, long, value_parser = parse_key)]
        key: Option<i32>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Add a file or directory to an existing archive
    Add {
        /// Archive header, data part or loose directory
        #[arg(short, long)]
        archive: PathBuf,

        /// Local file or directory to add
        #[arg(short, long)]
        source: PathBuf,

        /// Entry path (file) or entry directory prefix (directory)
        #[arg(short, long, default_value = "")]
        target: String,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Encrypt or decrypt a header file
    Crypt {
        #[command(subcommand)]
        command: CryptCommands,
    },

    /// Show or initialize the configuration file
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
pub enum CryptCommands {
    /// Decrypt an encrypted header into a plaintext copy
    Decrypt {
        input: PathBuf,
        output: PathBuf,
    },

    /// Encrypt a plaintext header
    Encrypt {
        input: PathBuf,
        output: PathBuf,

        /// Cipher key, defaults to the config value or the well-known key
        #[arg(short, long, value_parser = parse_key)]
        key: Option<i32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("0x295E2D5E"), Ok(0x295E2D5E));
        assert_eq!(parse_key("0xFFFFFFFF"), Ok(-1));
        assert_eq!(parse_key("-7"), Ok(-7));
        assert!(parse_key("zz").is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("9"), Ok(ArkVersion::V9));
        assert_eq!(parse_version("v10"), Ok(ArkVersion::V10));
        assert!(parse_version("11").is_err());
    }
}
