//! Pure line-attribute configuration.
//!
//! [`LineAttributes`] is an in-memory snapshot of a device's termios state.
//! Every setter is a read-modify-write against exactly the sub-mask it owns;
//! nothing here touches the device. A snapshot only takes effect once a
//! [`SerialLine`](super::SerialLine) commits it.

use super::error::{LineError, LineResult};
use std::fmt;

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Parity::None => write!(f, "None"),
            Parity::Even => write!(f, "Even"),
            Parity::Odd => write!(f, "Odd"),
        }
    }
}

/// XON/XOFF software flow control is all-or-nothing: input flow, output
/// flow, and any-character-restart move together.
const FLOW_BITS: libc::tcflag_t = libc::IXON | libc::IXOFF | libc::IXANY;

/// An in-memory snapshot of a serial line's termios attributes.
///
/// Obtained from [`SerialLine::attributes`](super::SerialLine::attributes)
/// or built from [`Default`] (an all-clear attribute set) in tests. Inert
/// until committed.
#[derive(Clone, Copy)]
pub struct LineAttributes {
    raw: libc::termios,
}

impl Default for LineAttributes {
    fn default() -> Self {
        // A zero-filled termios is the all-clear starting point; every
        // field of interest is set explicitly by the setters below.
        Self {
            raw: unsafe { std::mem::zeroed() },
        }
    }
}

impl LineAttributes {
    pub(crate) fn from_raw(raw: libc::termios) -> Self {
        Self { raw }
    }

    /// Borrow the underlying termios structure.
    pub fn as_raw(&self) -> &libc::termios {
        &self.raw
    }

    /// Mutably borrow the underlying termios structure, for settings this
    /// type does not name.
    pub fn as_raw_mut(&mut self) -> &mut libc::termios {
        &mut self.raw
    }

    /// Set the number of data bits per character.
    ///
    /// Accepted values: `5`, `6`, `7`, `8`. The character-size field is a
    /// multi-bit mask and is cleared before the new width is applied.
    pub fn set_data_bits(&mut self, bits: u8) -> LineResult<()> {
        let mask = match bits {
            5 => libc::CS5,
            6 => libc::CS6,
            7 => libc::CS7,
            8 => libc::CS8,
            _ => {
                return Err(LineError::invalid_parameter(format!(
                    "data bits must be 5-8, got {bits}"
                )))
            }
        };

        self.raw.c_cflag &= !libc::CSIZE;
        self.raw.c_cflag |= mask;
        Ok(())
    }

    /// Current number of data bits per character.
    pub fn data_bits(&self) -> u8 {
        match self.raw.c_cflag & libc::CSIZE {
            libc::CS5 => 5,
            libc::CS6 => 6,
            libc::CS7 => 7,
            _ => 8,
        }
    }

    /// Set the number of stop bits. Accepted values: `1`, `2`.
    pub fn set_stop_bits(&mut self, bits: u8) -> LineResult<()> {
        match bits {
            1 => self.raw.c_cflag &= !libc::CSTOPB,
            2 => self.raw.c_cflag |= libc::CSTOPB,
            _ => {
                return Err(LineError::invalid_parameter(format!(
                    "stop bits must be 1 or 2, got {bits}"
                )))
            }
        }
        Ok(())
    }

    /// Current number of stop bits.
    pub fn stop_bits(&self) -> u8 {
        if self.raw.c_cflag & libc::CSTOPB != 0 {
            2
        } else {
            1
        }
    }

    /// Set the parity mode.
    pub fn set_parity(&mut self, parity: Parity) {
        match parity {
            Parity::None => self.raw.c_cflag &= !libc::PARENB,
            Parity::Even => {
                self.raw.c_cflag |= libc::PARENB;
                self.raw.c_cflag &= !libc::PARODD;
            }
            Parity::Odd => {
                self.raw.c_cflag |= libc::PARENB;
                self.raw.c_cflag |= libc::PARODD;
            }
        }
    }

    /// Current parity mode.
    pub fn parity(&self) -> Parity {
        if self.raw.c_cflag & libc::PARENB == 0 {
            Parity::None
        } else if self.raw.c_cflag & libc::PARODD != 0 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    /// Enable or disable XON/XOFF software flow control. The three flow
    /// bits are never toggled independently.
    pub fn set_flow_control(&mut self, enabled: bool) {
        if enabled {
            self.raw.c_iflag |= FLOW_BITS;
        } else {
            self.raw.c_iflag &= !FLOW_BITS;
        }
    }

    /// Whether all three software flow control bits are set.
    pub fn software_flow_control(&self) -> bool {
        self.raw.c_iflag & FLOW_BITS == FLOW_BITS
    }

    /// Enable the receiver and ignore modem status lines, the precondition
    /// for reads on most devices.
    ///
    /// Enabling is the only supported direction; passing `false` leaves the
    /// snapshot unchanged.
    pub fn set_read_enabled(&mut self, enabled: bool) {
        if enabled {
            self.raw.c_cflag |= libc::CLOCAL | libc::CREAD;
        }
    }

    /// Whether the receiver is enabled and modem status lines are ignored.
    pub fn is_read_enabled(&self) -> bool {
        let bits = libc::CLOCAL | libc::CREAD;
        self.raw.c_cflag & bits == bits
    }

    /// Set the line speed, applied to both directions at once.
    ///
    /// The rate must be one of the standard baud rates the host defines a
    /// speed constant for; the device itself may still reject a standard
    /// rate, which surfaces when the snapshot is committed.
    pub fn set_speed(&mut self, baud: u32) -> LineResult<()> {
        let speed = baud_to_speed(baud).ok_or_else(|| {
            LineError::invalid_parameter(format!("unsupported baud rate {baud}"))
        })?;

        if unsafe { libc::cfsetspeed(&mut self.raw, speed) } != 0 {
            return Err(LineError::invalid_parameter(format!(
                "baud rate {baud} rejected"
            )));
        }
        Ok(())
    }

    /// The input-direction line speed in baud.
    pub fn input_speed(&self) -> u32 {
        speed_to_baud(unsafe { libc::cfgetispeed(&self.raw) })
    }

    /// The output-direction line speed in baud.
    pub fn output_speed(&self) -> u32 {
        speed_to_baud(unsafe { libc::cfgetospeed(&self.raw) })
    }

    /// Reads return immediately with whatever bytes are available, possibly
    /// none. Clears canonical mode; MIN=0, TIME=0.
    pub fn set_nonblocking_reads(&mut self) {
        self.raw.c_lflag &= !libc::ICANON;
        self.raw.c_cc[libc::VMIN] = 0;
        self.raw.c_cc[libc::VTIME] = 0;
    }

    /// Reads block until at least one byte is available, with no timeout.
    /// Clears canonical mode; MIN=1, TIME=0.
    pub fn set_blocking_reads(&mut self) {
        self.raw.c_lflag &= !libc::ICANON;
        self.raw.c_cc[libc::VMIN] = 1;
        self.raw.c_cc[libc::VTIME] = 0;
    }

    /// Reads block until a byte arrives or `deciseconds` elapse, whichever
    /// comes first; an expired timeout yields an empty read, not an error.
    /// Clears canonical mode; MIN=0, TIME=`deciseconds`.
    pub fn set_read_timeout(&mut self, deciseconds: u8) {
        self.raw.c_lflag &= !libc::ICANON;
        self.raw.c_cc[libc::VMIN] = 0;
        self.raw.c_cc[libc::VTIME] = deciseconds;
    }

    /// Whether canonical (line-buffered) input mode is enabled.
    pub fn is_canonical(&self) -> bool {
        self.raw.c_lflag & libc::ICANON != 0
    }

    /// The minimum-bytes control character (MIN).
    pub fn read_min(&self) -> u8 {
        self.raw.c_cc[libc::VMIN]
    }

    /// The read-timeout control character (TIME), in deciseconds.
    pub fn read_time(&self) -> u8 {
        self.raw.c_cc[libc::VTIME]
    }

    /// Read a control character by its index (e.g. `libc::VMIN`).
    pub fn control_char(&self, index: usize) -> LineResult<u8> {
        self.raw.c_cc.get(index).copied().ok_or_else(|| {
            LineError::invalid_parameter(format!("control character index {index} out of range"))
        })
    }

    /// Write a control character by its index. Direct access exists so
    /// combinations this type does not name, like MIN>0 with an inter-byte
    /// timeout, remain reachable.
    pub fn set_control_char(&mut self, index: usize, value: u8) -> LineResult<()> {
        let slot = self.raw.c_cc.get_mut(index).ok_or_else(|| {
            LineError::invalid_parameter(format!("control character index {index} out of range"))
        })?;
        *slot = value;
        Ok(())
    }
}

impl fmt::Debug for LineAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineAttributes")
            .field("data_bits", &self.data_bits())
            .field("parity", &self.parity())
            .field("stop_bits", &self.stop_bits())
            .field("software_flow_control", &self.software_flow_control())
            .field("read_enabled", &self.is_read_enabled())
            .field("canonical", &self.is_canonical())
            .field("read_min", &self.read_min())
            .field("read_time", &self.read_time())
            .finish()
    }
}

/// Whether `baud` maps to a speed constant on this host.
pub fn is_supported_baud(baud: u32) -> bool {
    baud_to_speed(baud).is_some()
}

pub(crate) fn baud_to_speed(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        0 => libc::B0,
        50 => libc::B50,
        75 => libc::B75,
        110 => libc::B110,
        134 => libc::B134,
        150 => libc::B150,
        200 => libc::B200,
        300 => libc::B300,
        600 => libc::B600,
        1_200 => libc::B1200,
        1_800 => libc::B1800,
        2_400 => libc::B2400,
        4_800 => libc::B4800,
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        #[cfg(target_os = "linux")]
        460_800 => libc::B460800,
        #[cfg(target_os = "linux")]
        500_000 => libc::B500000,
        #[cfg(target_os = "linux")]
        576_000 => libc::B576000,
        #[cfg(target_os = "linux")]
        921_600 => libc::B921600,
        #[cfg(target_os = "linux")]
        1_000_000 => libc::B1000000,
        #[cfg(target_os = "linux")]
        1_152_000 => libc::B1152000,
        #[cfg(target_os = "linux")]
        1_500_000 => libc::B1500000,
        #[cfg(target_os = "linux")]
        2_000_000 => libc::B2000000,
        #[cfg(target_os = "linux")]
        2_500_000 => libc::B2500000,
        #[cfg(target_os = "linux")]
        3_000_000 => libc::B3000000,
        #[cfg(target_os = "linux")]
        3_500_000 => libc::B3500000,
        #[cfg(target_os = "linux")]
        4_000_000 => libc::B4000000,
        _ => return None,
    };
    Some(speed)
}

fn speed_to_baud(speed: libc::speed_t) -> u32 {
    match speed {
        libc::B0 => 0,
        libc::B50 => 50,
        libc::B75 => 75,
        libc::B110 => 110,
        libc::B134 => 134,
        libc::B150 => 150,
        libc::B200 => 200,
        libc::B300 => 300,
        libc::B600 => 600,
        libc::B1200 => 1_200,
        libc::B1800 => 1_800,
        libc::B2400 => 2_400,
        libc::B4800 => 4_800,
        libc::B9600 => 9_600,
        libc::B19200 => 19_200,
        libc::B38400 => 38_400,
        libc::B57600 => 57_600,
        libc::B115200 => 115_200,
        libc::B230400 => 230_400,
        #[cfg(target_os = "linux")]
        libc::B460800 => 460_800,
        #[cfg(target_os = "linux")]
        libc::B500000 => 500_000,
        #[cfg(target_os = "linux")]
        libc::B576000 => 576_000,
        #[cfg(target_os = "linux")]
        libc::B921600 => 921_600,
        #[cfg(target_os = "linux")]
        libc::B1000000 => 1_000_000,
        #[cfg(target_os = "linux")]
        libc::B1152000 => 1_152_000,
        #[cfg(target_os = "linux")]
        libc::B1500000 => 1_500_000,
        #[cfg(target_os = "linux")]
        libc::B2000000 => 2_000_000,
        #[cfg(target_os = "linux")]
        libc::B2500000 => 2_500_000,
        #[cfg(target_os = "linux")]
        libc::B3000000 => 3_000_000,
        #[cfg(target_os = "linux")]
        libc::B3500000 => 3_500_000,
        #[cfg(target_os = "linux")]
        libc::B4000000 => 4_000_000,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_bits_masks() {
        let cases = [
            (5u8, libc::CS5),
            (6, libc::CS6),
            (7, libc::CS7),
            (8, libc::CS8),
        ];
        for (bits, mask) in cases {
            let mut attrs = LineAttributes::default();
            attrs.set_data_bits(bits).unwrap();
            assert_eq!(attrs.as_raw().c_cflag & libc::CSIZE, mask);
            assert_eq!(attrs.data_bits(), bits);
        }
    }

    #[test]
    fn test_data_bits_leave_neighbouring_masks_alone() {
        let mut attrs = LineAttributes::default();
        attrs.set_parity(Parity::Even);
        attrs.set_stop_bits(2).unwrap();

        attrs.set_data_bits(6).unwrap();

        assert_eq!(attrs.parity(), Parity::Even);
        assert_eq!(attrs.stop_bits(), 2);
        assert_eq!(attrs.data_bits(), 6);
    }

    #[test]
    fn test_data_bits_out_of_range_leaves_snapshot_unmodified() {
        for bits in [0u8, 4, 9, 255] {
            let mut attrs = LineAttributes::default();
            attrs.set_data_bits(8).unwrap();
            let before = attrs.as_raw().c_cflag;

            let err = attrs.set_data_bits(bits).unwrap_err();
            assert!(matches!(err, LineError::InvalidParameter(_)));
            assert_eq!(attrs.as_raw().c_cflag, before);
        }
    }

    #[test]
    fn test_stop_bits_out_of_range() {
        let mut attrs = LineAttributes::default();
        let err = attrs.set_stop_bits(3).unwrap_err();
        assert!(matches!(err, LineError::InvalidParameter(_)));
        assert_eq!(attrs.stop_bits(), 1);
    }

    #[test]
    fn test_parity_sequence_keeps_data_and_stop_bits() {
        let mut attrs = LineAttributes::default();
        attrs.set_data_bits(7).unwrap();
        attrs.set_stop_bits(2).unwrap();

        for parity in [Parity::Even, Parity::Odd, Parity::None] {
            attrs.set_parity(parity);
            assert_eq!(attrs.data_bits(), 7);
            assert_eq!(attrs.stop_bits(), 2);
            assert_eq!(attrs.parity(), parity);
        }

        assert_eq!(attrs.as_raw().c_cflag & libc::PARENB, 0);
    }

    #[test]
    fn test_flow_control_moves_all_three_bits_together() {
        let mut attrs = LineAttributes::default();

        attrs.set_flow_control(true);
        assert_eq!(attrs.as_raw().c_iflag & FLOW_BITS, FLOW_BITS);
        assert!(attrs.software_flow_control());

        attrs.set_flow_control(false);
        assert_eq!(attrs.as_raw().c_iflag & FLOW_BITS, 0);
        assert!(!attrs.software_flow_control());
    }

    #[test]
    fn test_read_timing_operations() {
        let mut attrs = LineAttributes::default();
        attrs.as_raw_mut().c_lflag |= libc::ICANON;

        attrs.set_blocking_reads();
        assert!(!attrs.is_canonical());
        assert_eq!(attrs.read_min(), 1);
        assert_eq!(attrs.read_time(), 0);

        attrs.as_raw_mut().c_lflag |= libc::ICANON;
        attrs.set_nonblocking_reads();
        assert!(!attrs.is_canonical());
        assert_eq!(attrs.read_min(), 0);
        assert_eq!(attrs.read_time(), 0);

        attrs.as_raw_mut().c_lflag |= libc::ICANON;
        attrs.set_read_timeout(5);
        assert!(!attrs.is_canonical());
        assert_eq!(attrs.read_min(), 0);
        assert_eq!(attrs.read_time(), 5);
    }

    #[test]
    fn test_inter_byte_timeout_remains_constructible() {
        // MIN>0 with TIME>0 is a valid POSIX combination even though no
        // named operation produces it.
        let mut attrs = LineAttributes::default();
        attrs.set_control_char(libc::VMIN, 16).unwrap();
        attrs.set_control_char(libc::VTIME, 3).unwrap();
        assert_eq!(attrs.read_min(), 16);
        assert_eq!(attrs.read_time(), 3);
    }

    #[test]
    fn test_control_char_index_out_of_range() {
        let mut attrs = LineAttributes::default();
        assert!(attrs.control_char(libc::NCCS).is_err());
        assert!(attrs.set_control_char(libc::NCCS, 1).is_err());
    }

    #[test]
    fn test_speed_applies_to_both_directions() {
        let mut attrs = LineAttributes::default();
        attrs.set_speed(9_600).unwrap();
        assert_eq!(attrs.input_speed(), 9_600);
        assert_eq!(attrs.output_speed(), 9_600);

        attrs.set_speed(115_200).unwrap();
        assert_eq!(attrs.input_speed(), 115_200);
        assert_eq!(attrs.output_speed(), 115_200);
    }

    #[test]
    fn test_unsupported_baud_leaves_snapshot_unmodified() {
        let mut attrs = LineAttributes::default();
        attrs.set_speed(9_600).unwrap();

        let err = attrs.set_speed(12_345).unwrap_err();
        assert!(matches!(err, LineError::InvalidParameter(_)));
        assert_eq!(attrs.input_speed(), 9_600);
        assert_eq!(attrs.output_speed(), 9_600);
    }

    #[test]
    fn test_is_supported_baud() {
        assert!(is_supported_baud(9_600));
        assert!(is_supported_baud(115_200));
        assert!(!is_supported_baud(12_345));
    }

    #[test]
    fn test_read_enable_is_one_way() {
        let mut attrs = LineAttributes::default();
        assert!(!attrs.is_read_enabled());

        attrs.set_read_enabled(true);
        assert!(attrs.is_read_enabled());

        // Disabling has no supported path; the call is a no-op.
        attrs.set_read_enabled(false);
        assert!(attrs.is_read_enabled());
    }

    #[test]
    fn test_default_snapshot_is_all_clear() {
        let attrs = LineAttributes::default();
        assert!(!attrs.is_read_enabled());
        assert!(!attrs.is_canonical());
        assert!(!attrs.software_flow_control());
        assert_eq!(attrs.read_min(), 0);
        assert_eq!(attrs.read_time(), 0);
    }
}
