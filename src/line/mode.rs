//! Compact line-mode descriptors ("8N1", "7E2").

use super::attrs::Parity;
use super::error::LineError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// One data-bits digit, one parity letter, one stop-bits digit.
static DESCRIPTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d)([NEO])(\d)$").expect("descriptor pattern is valid"));

/// A parsed 3-character line-mode descriptor.
///
/// Parsing checks the shape only; range checking of the digits belongs to
/// the attribute setters, so `"9N1"` parses here and is rejected by
/// [`LineAttributes::set_data_bits`](super::LineAttributes::set_data_bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMode {
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl FromStr for LineMode {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DESCRIPTOR
            .captures(s)
            .ok_or_else(|| LineError::InvalidModeDescriptor(s.to_string()))?;

        let parity = match &caps[2] {
            "N" => Parity::None,
            "E" => Parity::Even,
            _ => Parity::Odd,
        };
        let digit = |i: usize| caps[i].as_bytes()[0] - b'0';

        Ok(Self {
            data_bits: digit(1),
            parity,
            stop_bits: digit(3),
        })
    }
}

impl fmt::Display for LineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        write!(f, "{}{}{}", self.data_bits, letter, self.stop_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_descriptors() {
        let mode: LineMode = "8N1".parse().unwrap();
        assert_eq!(mode.data_bits, 8);
        assert_eq!(mode.parity, Parity::None);
        assert_eq!(mode.stop_bits, 1);

        let mode: LineMode = "7E2".parse().unwrap();
        assert_eq!(mode.data_bits, 7);
        assert_eq!(mode.parity, Parity::Even);
        assert_eq!(mode.stop_bits, 2);

        let mode: LineMode = "5O1".parse().unwrap();
        assert_eq!(mode.data_bits, 5);
        assert_eq!(mode.parity, Parity::Odd);
        assert_eq!(mode.stop_bits, 1);
    }

    #[test]
    fn test_malformed_descriptors_are_rejected() {
        for bad in ["X9Z", "", "8N", "8N11", "N81", "8-1", "8n1"] {
            let err = bad.parse::<LineMode>().unwrap_err();
            assert!(
                matches!(err, LineError::InvalidModeDescriptor(_)),
                "expected descriptor error for {bad:?}, got: {err:?}"
            );
        }
    }

    #[test]
    fn test_out_of_range_digits_still_parse() {
        // The pattern accepts any digit; the setters reject 9 data bits.
        let mode: LineMode = "9N1".parse().unwrap();
        assert_eq!(mode.data_bits, 9);
    }

    #[test]
    fn test_display_roundtrip() {
        for descriptor in ["8N1", "7E2", "6O1"] {
            let mode: LineMode = descriptor.parse().unwrap();
            assert_eq!(mode.to_string(), descriptor);
        }
    }
}
