//! # ESC/POS Text Styling Commands
//!
//! This module implements the character-formatting commands of ESC/POS.
//!
//! ## Text Styling Overview
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Emphasis | ESC E n | **Bold** text |
//! | Underline | ESC - n | Underlined text |
//! | Reverse | GS B n | White on black |
//! | Smoothing | GS b n | Smoothed edges on scaled glyphs |
//! | Size | GS ! n | 1×–8× width and height |
//! | Justification | ESC a n | Left / center / right |
//! | Font | ESC M n | Font A / B / C |
//!
//! ## Font Selection
//!
//! | Font | Size | Columns (80mm) |
//! |------|------|----------------|
//! | Font A | 12×24 dots | 48 chars |
//! | Font B | 9×17 dots | 64 chars |
//! | Font C | 9×24 dots | 64 chars (model dependent) |
//!
//! Every builder here takes the *target* value rather than toggling, so
//! sending the same command twice is harmless.

use super::commands::{ESC, GS};
use crate::error::ProxyError;

// ============================================================================
// JUSTIFICATION
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
///
/// - `n = 0`: Left (default)
/// - `n = 1`: Center
/// - `n = 2`: Right
///
/// Takes effect at the start of a line and also positions raster images.
///
/// ## Example
///
/// ```
/// use posproxy::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// FONT SELECTION
// ============================================================================

/// Available fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    /// Font A: 12×24 dots
    #[default]
    A = 0,
    /// Font B: 9×17 dots
    B = 1,
    /// Font C: model dependent, usually 9×24 dots
    C = 2,
}

/// # Select Character Font (ESC M n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC M n |
/// | Hex     | 1B 4D n |
///
/// ## Example
///
/// ```
/// use posproxy::protocol::text::{font, Font};
///
/// assert_eq!(font(Font::B), vec![0x1B, 0x4D, 0x01]);
/// ```
pub fn font(f: Font) -> Vec<u8> {
    vec![ESC, b'M', f as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Largest width or height multiplier accepted by `GS !`.
pub const MAX_SCALE: u8 = 8;

/// # Select Character Size (GS ! n)
///
/// Sets the horizontal and vertical magnification in one byte.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS ! n |
/// | Hex     | 1D 21 n |
///
/// ## Size Byte
///
/// ```text
/// bit  7 6 5 4   3 2 1 0
///      width-1   height-1
///
/// n = ((width - 1) << 4) | (height - 1)
/// ```
///
/// ## Errors
///
/// Both scales must lie in `1..=8`. Values outside the range are rejected
/// with [`ProxyError::InvalidParameter`], never clamped.
///
/// ## Example
///
/// ```
/// use posproxy::protocol::text::size;
///
/// // Double height only
/// assert_eq!(size(1, 2).unwrap(), vec![0x1D, 0x21, 0x01]);
/// // Double width and height
/// assert_eq!(size(2, 2).unwrap(), vec![0x1D, 0x21, 0x11]);
/// assert!(size(0, 1).is_err());
/// ```
pub fn size(width: u8, height: u8) -> Result<Vec<u8>, ProxyError> {
    Ok(vec![GS, b'!', size_byte(width, height)?])
}

/// Compute the `GS !` size byte for a width/height scale pair.
pub fn size_byte(width: u8, height: u8) -> Result<u8, ProxyError> {
    for (label, value) in [("width", width), ("height", height)] {
        if !(1..=MAX_SCALE).contains(&value) {
            return Err(ProxyError::InvalidParameter(format!(
                "{label} scale {value} outside 1-{MAX_SCALE}"
            )));
        }
    }
    Ok(((width - 1) << 4) | (height - 1))
}

// ============================================================================
// EMPHASIS / UNDERLINE / REVERSE / SMOOTHING
// ============================================================================

/// # Turn Emphasized Mode On/Off (ESC E n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC E n |
/// | Hex     | 1B 45 n |
#[inline]
pub fn emphasis(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

/// # Turn Underline Mode On/Off (ESC - n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC - n |
/// | Hex     | 1B 2D n |
///
/// `n = 1` selects the 1-dot underline. Spaces and tabs are not underlined.
#[inline]
pub fn underline(enabled: bool) -> Vec<u8> {
    vec![ESC, b'-', enabled as u8]
}

/// # Turn White/Black Reverse Printing On/Off (GS B n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS B n |
/// | Hex     | 1D 42 n |
///
/// ```text
/// Normal:   TEXT
/// Reverse:  ████████
///           ░TEXT░░░
///           ████████
/// ```
#[inline]
pub fn reverse(enabled: bool) -> Vec<u8> {
    vec![GS, b'B', enabled as u8]
}

/// # Turn Smoothing Mode On/Off (GS b n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS b n |
/// | Hex     | 1D 62 n |
///
/// Only visible on characters scaled 4× or more on most models.
#[inline]
pub fn smoothing(enabled: bool) -> Vec<u8> {
    vec![GS, b'b', enabled as u8]
}

// ============================================================================
// TESTS
// ============================================================================
