//! CLI command for the configuration file

use crate::config::ArkConfig;

pub fn execute(init: bool, config: &ArkConfig) -> anyhow::Result<()> {
    let Some(path) = ArkConfig::default_path() else {
        anyhow::bail!("No configuration directory on this platform");
    };

    if init {
        config.save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
