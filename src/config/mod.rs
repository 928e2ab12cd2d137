//! Configuration management for Flowmap
//!
//! Loading, environment overrides and validation of the analysis settings.
//! The data directory lives here and is threaded into the service at call time.

use crate::error::{FlowmapError, Result};
use crate::log::{NormalizeOptions, RowFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub data: DataConfig,
    /// Raw column name -> canonical column name
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_filter: Option<RowFilter>,
    pub process_map: ProcessMapConfig,
    pub durations: DurationsConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Where logs live and how they are parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub timestamp_format: String,
    pub delimiter: String,
}

/// Process map defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMapConfig {
    pub min_edge_occurrences: u64,
    #[serde(default)]
    pub register_target_nodes: bool,
}

/// Case duration distribution defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationsConfig {
    pub bin_count: usize,
    pub business_hours: bool,
    pub work_hours: [u32; 2],
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FlowmapError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FlowmapError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let config: Config = toml::from_str(&content)?;

        config.with_env_overrides()
    }

    /// Defaults plus environment overrides, used when no config file exists
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides, then validate the result
    fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_env_overrides();
        ConfigValidator::validate(&self)?;
        Ok(self)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| FlowmapError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: FLOWMAP_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("FLOWMAP_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "DATA__DIR" => {
                self.data.dir = PathBuf::from(value);
            }
            "DATA__TIMESTAMP_FORMAT" => {
                self.data.timestamp_format = value.to_string();
            }
            "DATA__DELIMITER" => {
                self.data.delimiter = value.to_string();
            }
            "PROCESS_MAP__MIN_EDGE_OCCURRENCES" => {
                self.process_map.min_edge_occurrences = parse_env(path, value)?;
            }
            "PROCESS_MAP__REGISTER_TARGET_NODES" => {
                self.process_map.register_target_nodes = parse_env(path, value)?;
            }
            "DURATIONS__BIN_COUNT" => {
                self.durations.bin_count = parse_env(path, value)?;
            }
            "DURATIONS__BUSINESS_HOURS" => {
                self.durations.business_hours = parse_env(path, value)?;
            }
            "DURATIONS__WORK_HOURS" => {
                self.durations.work_hours = parse_work_hours(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Normalizer settings derived from this configuration
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            timestamp_format: self.data.timestamp_format.clone(),
            row_filter: self.row_filter.clone(),
        }
    }

    /// Field delimiter as a single byte
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.data.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(FlowmapError::InvalidConfigValue {
                path: "data.delimiter".to_string(),
                message: format!(
                    "Delimiter must be a single ASCII character, got '{}'",
                    self.data.delimiter
                ),
            }),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FlowmapError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("flowmap").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| FlowmapError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

/// Accepts `9,17` or `[9, 17]`
fn parse_work_hours(path: &str, value: &str) -> Result<[u32; 2]> {
    let hours = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|h| parse_env::<u32>(path, h.trim()))
        .collect::<Result<Vec<_>>>()?;

    match hours.as_slice() {
        [start, end] => Ok([*start, *end]),
        _ => Err(FlowmapError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Expected two hours like \"9,17\", got '{}'", value),
        }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            data: DataConfig {
                dir: PathBuf::from("data"),
                timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
                delimiter: ",".to_string(),
            },
            columns: BTreeMap::new(),
            row_filter: None,
            process_map: ProcessMapConfig {
                min_edge_occurrences: 1,
                register_target_nodes: false,
            },
            durations: DurationsConfig {
                bin_count: 50,
                business_hours: true,
                work_hours: [9, 17],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.columns.insert("Naam".into(), crate::log::ACTIVITY.into());
        config.row_filter = Some(RowFilter {
            column: "Type".into(),
            equals: "Substatus".into(),
        });
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.columns.get("Naam").map(String::as_str), Some("concept:name"));
        assert_eq!(loaded.row_filter, config.row_filter);
        assert_eq!(loaded.durations.work_hours, [9, 17]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/flowmap.toml"));
        assert!(matches!(result, Err(FlowmapError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_env_value_parsing() {
        let mut config = Config::default();
        config.set_value_from_env("DURATIONS__BIN_COUNT", "20").unwrap();
        config.set_value_from_env("DATA__DIR", "/srv/logs").unwrap();
        assert_eq!(config.durations.bin_count, 20);
        assert_eq!(config.data.dir, PathBuf::from("/srv/logs"));

        let err = config.set_value_from_env("DURATIONS__BIN_COUNT", "many");
        assert!(matches!(err, Err(FlowmapError::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_env_work_hours() {
        let mut config = Config::default();
        config.set_value_from_env("DURATIONS__WORK_HOURS", "8,18").unwrap();
        assert_eq!(config.durations.work_hours, [8, 18]);
        config.set_value_from_env("DURATIONS__WORK_HOURS", "[7, 15]").unwrap();
        assert_eq!(config.durations.work_hours, [7, 15]);

        for bad in ["9", "9,17,20", "nine,five"] {
            let err = config.set_value_from_env("DURATIONS__WORK_HOURS", bad);
            assert!(matches!(err, Err(FlowmapError::InvalidConfigValue { .. })), "{bad}");
        }
        assert_eq!(config.durations.work_hours, [7, 15]);
    }

    #[test]
    fn test_defaults_are_validated_after_overrides() {
        let mut config = Config::default();
        config.data.delimiter = "||".to_string();
        assert!(matches!(
            config.with_env_overrides(),
            Err(FlowmapError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_delimiter_byte() {
        let mut config = Config::default();
        assert_eq!(config.delimiter_byte().unwrap(), b',');

        config.data.delimiter = ";;".to_string();
        assert!(config.delimiter_byte().is_err());
    }
}
