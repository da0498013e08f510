//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All sections carry defaults, so a missing file or a partial file is
//! always usable.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::line::{self, LineMode};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device selection
    pub device: DeviceConfig,
    /// Line parameters applied at open time
    pub line: LineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Device selection section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device path, e.g. `/dev/ttyUSB0`. The CLI requires it either here
    /// or via `--device`.
    pub path: Option<String>,
}

/// Line parameter section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Line speed in baud, both directions
    pub baud: u32,
    /// 3-character mode descriptor: data bits, parity letter, stop bits
    pub mode: String,
    /// Read timeout in deciseconds; 0 selects non-blocking reads
    pub read_timeout_ds: u8,
    /// XON/XOFF software flow control
    pub flow_control: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud: 9600,
            mode: "8N1".to_string(),
            read_timeout_ds: line::MODE_READ_TIMEOUT_DS,
            flow_control: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reject values the line engine itself would reject at apply time, so
    /// a bad config file fails at load rather than mid-session.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.line.mode.parse::<LineMode>().is_err() {
            return Err(ConfigError::validation(
                "line.mode",
                format!(
                    "'{}' is not a <dataBits><parity><stopBits> descriptor",
                    self.line.mode
                ),
            ));
        }
        if !line::is_supported_baud(self.line.baud) {
            return Err(ConfigError::validation(
                "line.baud",
                format!("{} is not a supported baud rate", self.line.baud),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.line.baud, 9600);
        assert_eq!(config.line.mode, "8N1");
        assert_eq!(config.line.read_timeout_ds, 5);
        assert!(!config.line.flow_control);
        assert_eq!(config.device.path, None);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [device]
            path = "/dev/ttyUSB0"

            [line]
            baud = 115200
            "#,
        )
        .unwrap();

        assert_eq!(config.device.path.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.line.baud, 115_200);
        assert_eq!(config.line.mode, "8N1");
    }

    #[test]
    fn test_validate_rejects_bad_mode() {
        let mut config = Config::default();
        config.line.mode = "X9Z".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("line.mode"));
    }

    #[test]
    fn test_validate_rejects_bad_baud() {
        let mut config = Config::default();
        config.line.baud = 12_345;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("line.baud"));
    }
}
