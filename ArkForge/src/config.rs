//! Archive creation options and persisted tool defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ark::ArkVersion;
use crate::error::{Error, Result};

fn default_version() -> u8 {
    ArkVersion::default().as_i32() as u8
}

/// Options for creating a new archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArkOptions {
    /// Header schema version
    pub version: ArkVersion,
    /// Header cipher key; `None` writes a plaintext header
    pub key: Option<i32>,
}

impl ArkOptions {
    #[must_use]
    pub fn new(version: ArkVersion) -> Self {
        Self { version, key: None }
    }

    /// Encrypt the header with `key`
    #[must_use]
    pub fn with_key(mut self, key: i32) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn encrypted(&self) -> bool {
        self.key.is_some()
    }
}

/// Tool defaults stored as JSON in the user's config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArkConfig {
    /// Version used by `create` when none is given
    #[serde(default = "default_version")]
    pub default_version: u8,
    /// Key used by `create` when encryption is requested without one
    #[serde(default)]
    pub default_key: Option<i32>,
    /// Worker threads for extraction (`None` uses rayon's default)
    #[serde(default)]
    pub extract_threads: Option<usize>,
}

impl Default for ArkConfig {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            default_key: None,
            extract_threads: None,
        }
    }
}

impl ArkConfig {
    /// `<config dir>/arkforge/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("arkforge").join("config.json"))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from the default location, falling back to defaults on any error
    #[must_use]
    pub fn load_or_default() -> Self {
        Self::default_path()
            .and_then(|path| match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring config at {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The configured default version, validated
    pub fn version(&self) -> Result<ArkVersion> {
        ArkVersion::try_from(i32::from(self.default_version))
    }

    /// Creation options from the stored defaults; `version` overrides the
    /// configured one
    pub fn options(&self, version: Option<ArkVersion>, encrypt: bool) -> Result<ArkOptions> {
        let version = match version {
            Some(version) => version,
            None => self.version()?,
        };
        let mut options = ArkOptions::new(version);
        if encrypt {
            options = options.with_key(self.default_key.unwrap_or(crate::ark::DEFAULT_KEY));
        }
        if options.encrypted() && options.version.is_single_file() {
            return Err(Error::EncryptionNotSupported {
                version: options.version.as_i32(),
            });
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ArkConfig = serde_json::from_str(r#"{"default_key": 5}"#).unwrap();
        assert_eq!(config.default_version, 9);
        assert_eq!(config.default_key, Some(5));
        assert_eq!(config.extract_threads, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = ArkConfig {
            default_version: 5,
            default_key: Some(crate::ark::DEFAULT_KEY),
            extract_threads: Some(2),
        };
        config.save(&path).unwrap();
        assert_eq!(ArkConfig::load(&path).unwrap(), config);
        assert_eq!(ArkConfig::load(&dir.path().join("missing.json")).unwrap(), ArkConfig::default());
    }

    #[test]
    fn test_options() {
        let config = ArkConfig::default();
        assert_eq!(config.options(None, false).unwrap(), ArkOptions::new(ArkVersion::V9));
        assert_eq!(
            config.options(None, true).unwrap().key,
            Some(crate::ark::DEFAULT_KEY)
        );
        assert_eq!(
            config.options(Some(ArkVersion::V5), false).unwrap().version,
            ArkVersion::V5
        );

        let legacy = ArkConfig {
            default_version: 2,
            ..ArkConfig::default()
        };
        assert!(matches!(
            legacy.options(None, true),
            Err(Error::EncryptionNotSupported { version: 2 })
        ));

        let bad = ArkConfig {
            default_version: 42,
            ..ArkConfig::default()
        };
        assert!(matches!(bad.version(), Err(Error::UnsupportedVersion { version: 42 })));
        assert!(bad.options(Some(ArkVersion::V10), true).is_ok());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(ArkConfig::load(&path), Err(Error::Config(_))));
    }
}
