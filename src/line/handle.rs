//! Serial line handle: device ownership, attribute fetch/commit, byte I/O.

use super::attrs::LineAttributes;
use super::error::{LineError, LineResult};
use super::mode::LineMode;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read timeout installed by [`SerialLine::apply_line_mode`], in
/// deciseconds (5 = 500 ms).
pub const MODE_READ_TIMEOUT_DS: u8 = 5;

/// An exclusively-owned, open serial line.
///
/// Owns the device descriptor and the in-memory [`LineAttributes`]
/// snapshot. Mutating the snapshot never changes device behavior on its
/// own; [`commit`](Self::commit) applies it. The descriptor is released
/// when the handle drops, so configuration failures after open cannot leak
/// the device.
pub struct SerialLine {
    device: File,
    path: PathBuf,
    attrs: LineAttributes,
}

impl SerialLine {
    /// Open the character device at `path` for exclusive read/write access
    /// and fetch its current attribute snapshot.
    ///
    /// The descriptor is opened with `O_NOCTTY` (the line must not become
    /// the controlling terminal) and `O_NONBLOCK` (the open itself must not
    /// hang on modem control); `O_NONBLOCK` is cleared again immediately so
    /// subsequent reads honor the committed MIN/TIME settings.
    pub fn open<P: AsRef<Path>>(path: P) -> LineResult<Self> {
        let path = path.as_ref().to_path_buf();

        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| LineError::open(path.display().to_string(), e))?;

        let metadata = device
            .metadata()
            .map_err(|e| LineError::open(path.display().to_string(), e))?;
        if !metadata.file_type().is_char_device() {
            return Err(LineError::not_a_character_device(path.display().to_string()));
        }

        let fd = device.as_raw_fd();
        clear_nonblock(fd).map_err(|e| LineError::open(path.display().to_string(), e))?;
        let attrs = fetch(fd)?;

        debug!(path = %path.display(), "opened serial line");
        Ok(Self {
            device,
            path,
            attrs,
        })
    }

    /// Open `path` and apply a full line mode in one step: the equivalent
    /// of [`open`](Self::open) followed by
    /// [`apply_line_mode`](Self::apply_line_mode).
    pub fn open_with_mode<P: AsRef<Path>>(
        path: P,
        baud: u32,
        descriptor: &str,
    ) -> LineResult<Self> {
        let mut line = Self::open(path)?;
        line.apply_line_mode(baud, descriptor)?;
        Ok(line)
    }

    /// The device path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The held attribute snapshot. Reflects the device state as of the
    /// last [`fetch_attributes`](Self::fetch_attributes) or open, plus any
    /// uncommitted local mutation.
    pub fn attributes(&self) -> &LineAttributes {
        &self.attrs
    }

    /// Mutable access to the held snapshot. Changes take effect at the
    /// next [`commit`](Self::commit).
    pub fn attributes_mut(&mut self) -> &mut LineAttributes {
        &mut self.attrs
    }

    /// Re-read the live attribute set from the device into the held
    /// snapshot, discarding uncommitted local changes.
    pub fn fetch_attributes(&mut self) -> LineResult<LineAttributes> {
        self.attrs = fetch(self.device.as_raw_fd())?;
        Ok(self.attrs)
    }

    /// Apply the held snapshot to the device immediately (`TCSANOW`):
    /// pending output is not drained and unread input is not flushed.
    pub fn commit(&self) -> LineResult<()> {
        retry_eintr(|| unsafe {
            libc::tcsetattr(self.device.as_raw_fd(), libc::TCSANOW, self.attrs.as_raw())
        })
        .map_err(LineError::AttributeWrite)?;

        debug!(path = %self.path.display(), "committed line attributes");
        Ok(())
    }

    /// Parse a 3-character mode descriptor and commit a complete line
    /// configuration: flow control off, the descriptor's framing, `baud` in
    /// both directions, a [`MODE_READ_TIMEOUT_DS`] read timeout, receiver
    /// enabled.
    ///
    /// All changes are staged on a copy of the snapshot, so a malformed
    /// descriptor or rejected parameter performs no commit and leaves the
    /// held snapshot untouched. The device only ever observes the
    /// fully-built attribute set.
    pub fn apply_line_mode(&mut self, baud: u32, descriptor: &str) -> LineResult<()> {
        let mode: LineMode = descriptor.parse()?;

        let mut staged = self.attrs;
        staged.set_flow_control(false);
        staged.set_data_bits(mode.data_bits)?;
        staged.set_stop_bits(mode.stop_bits)?;
        staged.set_parity(mode.parity);
        staged.set_speed(baud)?;
        staged.set_read_timeout(MODE_READ_TIMEOUT_DS);
        staged.set_read_enabled(true);

        self.attrs = staged;
        self.commit()?;

        debug!(path = %self.path.display(), %descriptor, baud, "applied line mode");
        Ok(())
    }

    /// Discard data received but not yet read.
    pub fn flush_input(&self) -> LineResult<()> {
        self.flush(libc::TCIFLUSH)
    }

    /// Discard data written but not yet transmitted.
    pub fn flush_output(&self) -> LineResult<()> {
        self.flush(libc::TCOFLUSH)
    }

    /// Discard both unread input and untransmitted output.
    pub fn flush_both(&self) -> LineResult<()> {
        self.flush(libc::TCIOFLUSH)
    }

    fn flush(&self, queue: libc::c_int) -> LineResult<()> {
        retry_eintr(|| unsafe { libc::tcflush(self.device.as_raw_fd(), queue) })?;
        debug!(path = %self.path.display(), queue, "flushed");
        Ok(())
    }

    /// Block until all queued output has been transmitted.
    pub fn drain(&self) -> LineResult<()> {
        retry_eintr(|| unsafe { libc::tcdrain(self.device.as_raw_fd()) })?;
        Ok(())
    }

    /// Read into `buffer` under the committed MIN/TIME regime.
    ///
    /// An expired read timeout is a normal empty result, `Ok(0)`, not an
    /// error. Interrupted calls are retried transparently.
    pub fn read(&mut self, buffer: &mut [u8]) -> LineResult<usize> {
        loop {
            match self.device.read(buffer) {
                Ok(n) => return Ok(n),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(0),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LineError::Io(e)),
            }
        }
    }

    /// Write `buffer` to the line, returning how many bytes were accepted
    /// into the output queue. Interrupted calls are retried transparently.
    pub fn write(&mut self, buffer: &[u8]) -> LineResult<usize> {
        loop {
            match self.device.write(buffer) {
                Ok(n) => return Ok(n),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(0),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LineError::Io(e)),
            }
        }
    }

    /// Write all of `buffer`, looping over short writes.
    pub fn write_all(&mut self, mut buffer: &[u8]) -> LineResult<()> {
        while !buffer.is_empty() {
            let n = self.write(buffer)?;
            if n == 0 {
                return Err(LineError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "device accepted no bytes",
                )));
            }
            buffer = &buffer[n..];
        }
        Ok(())
    }

    /// Release the device. Dropping the handle has the same effect; the
    /// explicit form marks the end of the line's scope at the call site,
    /// and consuming `self` makes any later use a compile error.
    pub fn close(self) {}
}

impl AsRawFd for SerialLine {
    fn as_raw_fd(&self) -> RawFd {
        self.device.as_raw_fd()
    }
}

impl Drop for SerialLine {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "closing serial line");
    }
}

impl fmt::Debug for SerialLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialLine")
            .field("path", &self.path)
            .field("attrs", &self.attrs)
            .finish()
    }
}

/// Read the live attribute set from a descriptor.
fn fetch(fd: RawFd) -> LineResult<LineAttributes> {
    let mut raw: libc::termios = unsafe { std::mem::zeroed() };
    retry_eintr(|| unsafe { libc::tcgetattr(fd, &mut raw) }).map_err(LineError::AttributeRead)?;
    Ok(LineAttributes::from_raw(raw))
}

/// Clear `O_NONBLOCK` so reads honor MIN/TIME instead of returning
/// immediately.
fn clear_nonblock(fd: RawFd) -> std::io::Result<()> {
    let flags = retry_eintr(|| unsafe { libc::fcntl(fd, libc::F_GETFL, 0) })?;
    retry_eintr(|| unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) })?;
    Ok(())
}

/// Run a libc call, retrying while it fails with `EINTR`.
fn retry_eintr<F>(mut call: F) -> std::io::Result<libc::c_int>
where
    F: FnMut() -> libc::c_int,
{
    loop {
        let rc = call();
        if rc != -1 {
            return Ok(rc);
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
