use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use sd_codec::CodecConfig;
use sd_diff::EngineConfig;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sdelta.toml";

/// CLI configuration, loaded from TOML.
///
/// ```toml
/// [engine]
/// max_depth = 256
///
/// [codec]
/// format = "bincode"
/// verify_digests = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub codec: CodecConfig,
}

impl CliConfig {
    /// Load from an explicit path, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parse TOML text.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_codec::PayloadFormat;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(CliConfig::parse("").unwrap(), CliConfig::default());
    }

    #[test]
    fn full_config() {
        let c = CliConfig::parse(
            r#"
            [engine]
            max_depth = 16

            [codec]
            format = "json"
            verify_digests = false
            "#,
        )
        .unwrap();
        assert_eq!(c.engine.max_depth, 16);
        assert_eq!(c.codec.format, PayloadFormat::Json);
        assert!(!c.codec.verify_digests);
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let c = CliConfig::parse("[engine]\nmax_depth = 8\n").unwrap();
        assert_eq!(c.engine.max_depth, 8);
        assert!(c.codec.verify_digests);
        assert_eq!(c.codec.format, PayloadFormat::Bincode);
    }

    #[test]
    fn unknown_engine_setting_rejected() {
        assert!(CliConfig::parse("[engine]\nduplicate_policy = \"allow\"\n").is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[codec]\nformat = \"json\"\n").unwrap();
        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.codec.format, PayloadFormat::Json);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
