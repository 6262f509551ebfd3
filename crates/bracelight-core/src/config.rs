//! Matcher configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! Serde is Rust's standard for serialization/deserialization.
//! The `#[derive(Serialize, Deserialize)]` macro generates
//! code to convert structs to/from JSON, TOML, etc.
//!
//! `#[serde(default)]` uses Default::default() for missing fields,
//! making configs backward-compatible.
//!
//! ```toml
//! [braces]
//! pairs = [{ open = "(", close = ")" }, { open = "{", close = "}" }]
//!
//! [languages.rust]
//! pairs = [{ open = "(", close = ")" }, { open = "[", close = "]" }, { open = "{", close = "}" }, { open = "<", close = ">" }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::CoreResult;
use crate::delimiter::{DEFAULT_PAIRS, DelimiterPair, DelimiterTable};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pairs used when no language override applies
    pub braces: BraceConfig,

    /// Language-specific settings
    pub languages: HashMap<String, LanguageConfig>,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Using default config: {}", err);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("bracelight").join("config.toml"))
    }

    /// Returns config for a specific language.
    pub fn language(&self, lang: &str) -> LanguageConfig {
        self.languages.get(lang).cloned().unwrap_or_default()
    }

    /// Builds the validated delimiter table for `lang`.
    pub fn delimiter_table(&self, lang: Option<&str>) -> CoreResult<DelimiterTable> {
        let pairs = lang
            .and_then(|lang| self.language(lang).pairs)
            .unwrap_or_else(|| self.braces.pairs.clone());
        DelimiterTable::new(pairs)
    }
}

/// The default delimiter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BraceConfig {
    pub pairs: Vec<DelimiterPair>,
}

impl Default for BraceConfig {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_PAIRS.to_vec(),
        }
    }
}

/// Language-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Replaces the default pairs for this language
    pub pairs: Option<Vec<DelimiterPair>>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.braces.pairs.len(), 3);
        assert_eq!(config.delimiter_table(None).unwrap(), DelimiterTable::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.braces.pairs, config.braces.pairs);
    }

    #[test]
    fn test_language_override() {
        let config: Config = toml::from_str(
            r#"
            [braces]
            pairs = [{ open = "(", close = ")" }]

            [languages.rust]
            pairs = [{ open = "<", close = ">" }, { open = "{", close = "}" }]
            "#,
        )
        .unwrap();

        let default = config.delimiter_table(None).unwrap();
        assert!(default.is_open('('));
        assert!(!default.is_open('{'));

        let rust = config.delimiter_table(Some("rust")).unwrap();
        assert!(rust.is_open('<'));
        assert!(!rust.is_open('('));

        // unknown languages fall back to the default pairs
        let other = config.delimiter_table(Some("python")).unwrap();
        assert_eq!(other, default);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.braces.pairs, DEFAULT_PAIRS.to_vec());
        assert!(config.languages.is_empty());
    }

    #[test]
    fn test_overlapping_pairs_rejected() {
        let config: Config = toml::from_str(
            r#"
            [braces]
            pairs = [{ open = "'", close = "'" }]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.delimiter_table(None),
            Err(CoreError::OverlappingDelimiter('\''))
        ));
    }

    #[test]
    fn test_multichar_delimiter_is_a_parse_error() {
        let parsed = toml::from_str::<Config>(
            r#"
            [braces]
            pairs = [{ open = "<%", close = "%>" }]
            "#,
        );
        assert!(parsed.is_err());
    }
}
