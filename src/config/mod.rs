//! Configuration module for ttyline.
//!
//! This module provides TOML-based configuration with environment variable
//! overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of
//! priority):
//!
//! 1. `TTYLINE_CONFIG` environment variable (explicit path)
//! 2. `./ttyline.toml` (current directory)
//! 3. The platform config directory (e.g. `~/.config/ttyline/ttyline.toml`)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Individual values can be overridden via environment variables using the
//! pattern `TTYLINE_<SECTION>_<KEY>`:
//!
//! - `TTYLINE_DEVICE_PATH=/dev/ttyUSB1`
//! - `TTYLINE_LINE_BAUD=115200`
//! - `TTYLINE_LINE_MODE=7E2`
//! - `TTYLINE_LINE_READ_TIMEOUT_DS=20`
//! - `TTYLINE_LOGGING_LEVEL=debug`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, DeviceConfig, LineConfig, LoggingConfig};
