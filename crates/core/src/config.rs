use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-level configuration: database, logging and engine tuning. Loaded
/// from an optional TOML file, then overridden by `POOLQUOTE_*` environment
/// variables. Missing sections fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://poolquote.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whole-unit currency of all resolved prices.
    pub currency: String,
    /// Configuration values that never map to a product. The catalog owner
    /// may extend this beyond the default sentinel.
    pub skip_values: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { currency: "CZK".to_string(), skip_values: vec!["none".to_string()] }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("POOLQUOTE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = env::var("POOLQUOTE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(currency) = env::var("POOLQUOTE_CURRENCY") {
            self.engine.currency = currency;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, LogFormat};

    #[test]
    fn defaults_apply_without_a_file() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.engine.skip_values, vec!["none".to_string()]);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[engine]\ncurrency = \"EUR\"\nskip_values = [\"none\", \"na\"]\n\n[logging]\nformat = \"json\"\n"
        )
        .expect("write config");

        let config = AppConfig::load(Some(file.path())).expect("load config");
        assert_eq!(config.engine.currency, "EUR");
        assert_eq!(config.engine.skip_values.len(), 2);
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched section keeps defaults
        assert_eq!(config.database.timeout_secs, 30);
    }

    #[test]
    fn rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "not toml at all [[[").expect("write config");

        assert!(AppConfig::load(Some(file.path())).is_err());
    }
}
