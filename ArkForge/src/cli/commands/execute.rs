//! Command execution implementations

use super::{Commands, CryptCommands};
use super::{add, config, create, crypt, extract, info, list};
use crate::config::ArkConfig;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self, config: &ArkConfig) -> anyhow::Result<()> {
        match self {
            Commands::List {
                source,
                detailed,
                filter,
                count,
                json,
            } => list::execute(source, *detailed, filter.as_deref(), *count, *json),
            Commands::Info { source, json } => info::execute(source, *json),
            Commands::Extract {
                source,
                destination,
                filter,
                file,
                threads,
                quiet,
            } => extract::execute(
                source,
                destination,
                filter.as_deref(),
                file,
                threads.or(config.extract_threads),
                *quiet,
            ),
            Commands::Create {
                source,
                destination,
                version,
                encrypt,
                key,
                quiet,
            } => create::execute(source, destination, *version, *encrypt, *key, *quiet, config),
            Commands::Add {
                archive,
                source,
                target,
                quiet,
            } => add::execute(archive, source, target, *quiet),
            Commands::Crypt { command } => command.execute(config),
            Commands::Config { init } => config::execute(*init, config),
        }
    }
}

impl CryptCommands {
    /// Execute the selected crypt command.
    ///
    /// # Errors
    /// Returns an error if the header cannot be read or written.
    pub fn execute(&self, config: &ArkConfig) -> anyhow::Result<()> {
        match self {
            CryptCommands::Decrypt { input, output } => crypt::decrypt(input, output),
            CryptCommands::Encrypt { input, output, key } => crypt::encrypt(
                input,
                output,
                key.or(config.default_key).unwrap_or(crate::ark::DEFAULT_KEY),
            ),
        }
    }
}
