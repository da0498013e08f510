//! ttyline
//!
//! Serial line configuration and byte-level I/O over POSIX termios.
//!
//! This library turns human-level line parameters (a baud rate, a compact
//! "8N1" mode descriptor, a read timeout, a flow-control switch) into the
//! termios control bits and MIN/TIME read-timing settings the kernel
//! consumes, and owns the device handle the configuration is committed
//! through.
//!
//! # Modules
//!
//! - `line`: the attribute configurator and the serial line handle
//! - `config`: TOML configuration with environment variable overrides
//!
//! Non-POSIX hosts are out of scope; everything here talks to the host's
//! termios facility through `libc`.

pub mod config;
pub mod line;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use line::{
    is_supported_baud, LineAttributes, LineError, LineMode, LineResult, Parity, SerialLine,
    MODE_READ_TIMEOUT_DS,
};
