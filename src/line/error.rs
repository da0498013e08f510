//! Line-specific error types.
//!
//! Defines error types for serial line configuration and I/O, separate from
//! the configuration-file errors in [`crate::config`].

use thiserror::Error;

/// Errors that can occur while configuring or operating a serial line.
#[derive(Debug, Error)]
pub enum LineError {
    /// The device could not be opened for exclusive read/write access, or
    /// the path does not name a character device.
    #[error("failed to open serial device '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Querying the live attribute set from the device failed, typically
    /// because the descriptor is not a tty.
    #[error("failed to read line attributes: {0}")]
    AttributeRead(#[source] std::io::Error),

    /// The device rejected an attribute snapshot.
    #[error("failed to apply line attributes: {0}")]
    AttributeWrite(#[source] std::io::Error),

    /// A setter was called with an out-of-range parameter.
    #[error("invalid line parameter: {0}")]
    InvalidParameter(String),

    /// A mode descriptor did not match the 3-character
    /// `<dataBits><parityLetter><stopBits>` pattern.
    #[error("invalid mode descriptor '{0}': expected digit, parity letter (N/E/O), digit")]
    InvalidModeDescriptor(String),

    /// An I/O error occurred during a read, write, flush, or drain.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LineError {
    /// Create an `Open` error from a device path and an OS error.
    pub fn open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create an `InvalidParameter` error from a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create an `Open` error for a path that is not a character device.
    pub(crate) fn not_a_character_device(path: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a character device"),
        }
    }
}

/// Result type for line operations.
pub type LineResult<T> = Result<T, LineError>;
