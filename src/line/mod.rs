//! Serial line configuration over POSIX termios.
//!
//! Two collaborating pieces:
//!
//! - [`SerialLine`] owns the open device descriptor and the in-memory
//!   attribute snapshot; it fetches live attributes, commits them back, and
//!   performs blocking byte I/O and queue flushes.
//! - [`LineAttributes`] is the pure configurator: named setters that map
//!   speed, framing, flow control, and read-timing parameters onto the
//!   termios control bits. It never touches the device.
//!
//! The usual path is the one-shot form:
//!
//! ```rust,no_run
//! use ttyline::SerialLine;
//!
//! let mut line = SerialLine::open_with_mode("/dev/ttyUSB0", 9600, "8N1")?;
//! let mut buf = [0u8; 256];
//! let n = line.read(&mut buf)?;
//! # Ok::<(), ttyline::LineError>(())
//! ```
//!
//! Fine-grained control goes through the snapshot:
//!
//! ```rust,no_run
//! use ttyline::SerialLine;
//!
//! let mut line = SerialLine::open("/dev/ttyUSB0")?;
//! line.attributes_mut().set_speed(115_200)?;
//! line.attributes_mut().set_blocking_reads();
//! line.commit()?;
//! # Ok::<(), ttyline::LineError>(())
//! ```

mod attrs;
mod error;
mod handle;
mod mode;

pub use attrs::{is_supported_baud, LineAttributes, Parity};
pub use error::{LineError, LineResult};
pub use handle::{SerialLine, MODE_READ_TIMEOUT_DS};
pub use mode::LineMode;
