//! # Printer Configuration
//!
//! This module defines hardware limits of the receipt printers the proxy
//! drives.
//!
//! ## Supported Paper Widths
//!
//! | Preset | Width (dots) | Resolution | Max raster height |
//! |--------|--------------|------------|-------------------|
//! | EPSON_80MM | 576 | 203 DPI | 2303 rows |
//! | EPSON_58MM | 384 | 203 DPI | 2303 rows |
//!
//! ## Usage
//!
//! ```
//! use posproxy::printer::PrinterConfig;
//!
//! let config = PrinterConfig::EPSON_80MM;
//! assert_eq!(config.width_bytes, 72);
//! ```

use crate::error::ProxyError;

/// Largest `yL + yH * 256` value `GS v 0` accepts.
pub const MAX_RASTER_HEIGHT: u16 = 2303;

/// # Printer Configuration
///
/// ## Physical Properties
///
/// - **width_dots**: Maximum printable width in dots; wider raster images
///   are rejected rather than cropped
/// - **width_bytes**: Width in bytes (width_dots / 8)
/// - **dpi**: Resolution in dots per inch
/// - **max_raster_height**: Tallest single raster command the firmware takes
///
/// At 203 DPI (about 8 dots/mm) the 576 dots of 80mm paper cover the 72mm
/// printable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u16,

    /// Print width in bytes (width_dots / 8)
    pub width_bytes: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Maximum rows in one raster image
    pub max_raster_height: u16,
}

impl PrinterConfig {
    /// # 80mm Epson-compatible printer (TM-T88, TM-T20, TM-m30)
    ///
    /// ```text
    /// ├── 4mm ──┼────── 72mm printable ──────┼── 4mm ──┤
    /// │ margin  │         576 dots           │ margin  │
    /// ```
    pub const EPSON_80MM: Self = Self {
        name: "Epson 80mm",
        width_dots: 576,
        width_bytes: 72,
        dpi: 203,
        max_raster_height: MAX_RASTER_HEIGHT,
    };

    /// # 58mm Epson-compatible printer (TM-P20, TM-m10)
    pub const EPSON_58MM: Self = Self {
        name: "Epson 58mm",
        width_dots: 384,
        width_bytes: 48,
        dpi: 203,
        max_raster_height: MAX_RASTER_HEIGHT,
    };

    /// Pick a preset by print width, or build a custom profile.
    ///
    /// ## Errors
    ///
    /// A width of zero is rejected.
    ///
    /// ## Example
    ///
    /// ```
    /// use posproxy::printer::PrinterConfig;
    ///
    /// assert_eq!(PrinterConfig::for_width(384).unwrap(), PrinterConfig::EPSON_58MM);
    /// assert_eq!(PrinterConfig::for_width(512).unwrap().width_bytes, 64);
    /// ```
    pub fn for_width(width_dots: u16) -> Result<Self, ProxyError> {
        match width_dots {
            0 => Err(ProxyError::InvalidParameter(
                "printer width must be non-zero".to_string(),
            )),
            576 => Ok(Self::EPSON_80MM),
            384 => Ok(Self::EPSON_58MM),
            w => Ok(Self {
                name: "Custom",
                width_dots: w,
                width_bytes: w.div_ceil(8),
                ..Self::EPSON_80MM
            }),
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::EPSON_80MM
    }
}

// ============================================================================
// TESTS
// ============================================================================
