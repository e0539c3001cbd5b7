//! # ESC/POS Protocol Commands
//!
//! This module implements the device-control half of the ESC/POS command set
//! used by Epson-compatible thermal receipt printers (TM-T88, TM-T20, TM-m30
//! and the many clones that speak the same dialect).
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC J n`, `GS V m n`, `ESC p m t1 t2`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Idempotence
//!
//! Every builder is a pure function of its arguments. Whether a command is
//! needed at all is decided by the state machine in [`crate::ir`], never here.

use crate::error::ProxyError;

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for character size, reverse video, cutter and raster commands.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// End-of-job marker appended after the last command of every job.
pub const END_OF_JOB: u8 = 0xFA;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets every mode to its power-on default.
/// Every job starts with this command so that no formatting leaks in from
/// a previous job on the same connection.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## What Gets Reset
///
/// - Font A, 1×1 character size
/// - Emphasis, underline, reverse and smoothing off
/// - Left justification
///
/// ## Example
///
/// ```
/// use posproxy::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// End-of-job marker (0xFA).
///
/// Closes every job's byte stream. Together with [`init`] it brackets all
/// other bytes a job sends to the device.
#[inline]
pub fn end_of_job() -> Vec<u8> {
    vec![END_OF_JOB]
}

// ============================================================================
// PAPER FEED COMMANDS
// ============================================================================

/// # Line Feed (LF)
///
/// Prints the line buffer and advances the paper by one line.
#[inline]
pub fn line_feed() -> Vec<u8> {
    vec![LF]
}

/// # Print and Feed Paper (ESC J n)
///
/// Feeds by `n` motion units (one dot at the default 180/203 DPI setup).
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC J n |
/// | Hex     | 1B 4A n |
///
/// ## Example
///
/// ```
/// use posproxy::protocol::commands;
///
/// assert_eq!(commands::feed_dots(24), vec![0x1B, 0x4A, 24]);
/// ```
#[inline]
pub fn feed_dots(n: u8) -> Vec<u8> {
    vec![ESC, b'J', n]
}

// ============================================================================
// CUTTER CONTROL
// ============================================================================

/// Cutter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutMode {
    /// Cut all the way through.
    #[default]
    Full,
    /// Leave a small hinge so the receipt does not drop.
    Partial,
}

/// # Select Cut Mode and Cut Paper (GS V)
///
/// ## Protocol Details
///
/// | Function | Format | Hex |
/// |----------|--------|-----|
/// | A: cut at current position | GS V m | 1D 56 m (m = 0 full, 1 partial) |
/// | B: feed then cut | GS V m n | 1D 56 m n (m = 65 full, 66 partial) |
///
/// Function B feeds the paper to the cutting position plus `n` lines and
/// then cuts, so nothing printed last is lost under the cutter.
///
/// ## Example
///
/// ```
/// use posproxy::protocol::commands::{cut, CutMode};
///
/// assert_eq!(cut(CutMode::Full, None), vec![0x1D, 0x56, 0x00]);
/// assert_eq!(cut(CutMode::Partial, Some(3)), vec![0x1D, 0x56, 0x42, 0x03]);
/// ```
pub fn cut(mode: CutMode, feed: Option<u8>) -> Vec<u8> {
    let m = match mode {
        CutMode::Full => 0,
        CutMode::Partial => 1,
    };
    match feed {
        None => vec![GS, b'V', m],
        Some(n) => vec![GS, b'V', 65 + m, n],
    }
}

// ============================================================================
// CASH DRAWER
// ============================================================================

/// Drawer kick-out connector pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerPin {
    /// Connector pin 2 (`drawer_1`)
    #[default]
    Pin2 = 0,
    /// Connector pin 5 (`drawer_2`)
    Pin5 = 1,
}

/// # Generate Pulse (ESC p m t1 t2)
///
/// Kicks the cash drawer connected to the printer.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC p m t1 t2 |
/// | Hex     | 1B 70 m t1 t2 |
///
/// - `m`: connector pin (0 = pin 2, 1 = pin 5)
/// - `t1`: on time in 2 ms units
/// - `t2`: off time in 2 ms units
///
/// On and off time are both set to `on_ms`.
///
/// ## Errors
///
/// `on_ms` must be between 2 and 510 ms.
///
/// ## Example
///
/// ```
/// use posproxy::protocol::commands::{pulse, DrawerPin};
///
/// assert_eq!(pulse(DrawerPin::Pin2, 100).unwrap(), vec![0x1B, 0x70, 0x00, 50, 50]);
/// ```
pub fn pulse(pin: DrawerPin, on_ms: u16) -> Result<Vec<u8>, ProxyError> {
    if !(2..=510).contains(&on_ms) {
        return Err(ProxyError::InvalidParameter(format!(
            "pulse time {on_ms}ms outside 2-510ms"
        )));
    }
    let t = (on_ms / 2) as u8;
    Ok(vec![ESC, b'p', pin as u8, t, t])
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ## Example
///
/// ```
/// use posproxy::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(576), [0x40, 0x02]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_end_of_job() {
        assert_eq!(end_of_job(), vec![0xFA]);
    }

    #[test]
    fn test_line_feed() {
        assert_eq!(line_feed(), vec![0x0A]);
    }

    #[test]
    fn test_feed_dots() {
        assert_eq!(feed_dots(0), vec![0x1B, 0x4A, 0x00]);
        assert_eq!(feed_dots(255), vec![0x1B, 0x4A, 0xFF]);
    }

    #[test]
    fn test_cut_immediate() {
        assert_eq!(cut(CutMode::Full, None), vec![0x1D, 0x56, 0x00]);
        assert_eq!(cut(CutMode::Partial, None), vec![0x1D, 0x56, 0x01]);
    }

    #[test]
    fn test_cut_with_feed() {
        assert_eq!(cut(CutMode::Full, Some(0)), vec![0x1D, 0x56, 0x41, 0x00]);
        assert_eq!(cut(CutMode::Partial, Some(5)), vec![0x1D, 0x56, 0x42, 0x05]);
    }

    #[test]
    fn test_pulse() {
        assert_eq!(
            pulse(DrawerPin::Pin2, 100).unwrap(),
            vec![0x1B, 0x70, 0x00, 0x32, 0x32]
        );
        assert_eq!(
            pulse(DrawerPin::Pin5, 500).unwrap(),
            vec![0x1B, 0x70, 0x01, 0xFA, 0xFA]
        );
    }

    #[test]
    fn test_pulse_rejects_out_of_range() {
        assert!(matches!(
            pulse(DrawerPin::Pin2, 0),
            Err(ProxyError::InvalidParameter(_))
        ));
        assert!(matches!(
            pulse(DrawerPin::Pin2, 600),
            Err(ProxyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_builders_are_repeatable() {
        assert_eq!(cut(CutMode::Full, Some(2)), cut(CutMode::Full, Some(2)));
        assert_eq!(feed_dots(4), feed_dots(4));
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(576), [0x40, 0x02]);
    }
}
