//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MIN_SIDE: u32 = 100;
        const MAX_SIDE: u32 = 4096;

        for (name, value) in [("width", self.charts.width), ("height", self.charts.height)] {
            if !(MIN_SIDE..=MAX_SIDE).contains(&value) {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "Invalid chart {name} {value}. Must be between {MIN_SIDE} and {MAX_SIDE}"
                    ),
                });
            }
        }

        if self.charts.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Chart output_dir must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Chart rendering configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartsConfig {
    /// Directory where rendered SVG charts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Canvas width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("visualizations")
}

const fn default_width() -> u32 {
    960
}

const fn default_height() -> u32 {
    600
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "charts": {
                "output_dir": "/tmp/charts",
                "width": 1280,
                "height": 720
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.charts.output_dir, PathBuf::from("/tmp/charts"));
        assert_eq!(config.charts.width, 1280);
        assert_eq!(config.charts.height, 720);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn charts_config_defaults() {
        let config = ChartsConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("visualizations"));
        assert_eq!(config.width, 960);
        assert_eq!(config.height, 600);
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn reject_out_of_range_canvas() {
        let json = r#"{
            "charts": {
                "width": 10
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
