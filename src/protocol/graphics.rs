//! # ESC/POS Raster Graphics
//!
//! This module implements the raster bit-image command used to print
//! embedded bitmaps.
//!
//! ## Coordinate System
//!
//! ```text
//! (0,0) ──────────────────────► X (horizontal, 576 dots max on 80mm paper)
//!   │
//!   │   ████████  ← Each dot is ~0.125mm (203 DPI)
//!   │   ████████
//!   ▼
//!   Y (vertical, paper feed direction)
//! ```
//!
//! ## Bit Packing
//!
//! Graphics data is packed as bytes where each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```

use super::commands::{GS, u16_le};
use crate::error::ProxyError;

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH d1...dk |
/// | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
///
/// ## Parameters
///
/// - `m`: scaling mode, always 0 (normal density)
/// - `xL, xH`: width in **bytes**, little-endian
/// - `yL, yH`: height in dots, little-endian
/// - `d1...dk`: k = width_bytes × height bytes, row-major
///
/// ## Data Layout
///
/// ```text
/// Row 0:    d[0]      d[1]       ... d[width-1]
/// Row 1:    d[width]  d[width+1] ... d[2*width-1]
/// ...
/// Row h-1:  d[(h-1)*width] ... d[h*width-1]
/// ```
///
/// ## Errors
///
/// Zero width or height, or a data length other than
/// `ceil(width_dots / 8) * height`, is [`ProxyError::InvalidParameter`].
///
/// ## Example
///
/// ```
/// use posproxy::protocol::graphics;
///
/// // 16 dots wide (2 bytes), 3 rows
/// let cmd = graphics::raster(16, 3, &[0xFF; 6]).unwrap();
/// assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0x00, 2, 0, 3, 0]);
/// assert_eq!(cmd.len(), 8 + 6);
/// ```
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Result<Vec<u8>, ProxyError> {
    if width_dots == 0 || height == 0 {
        return Err(ProxyError::InvalidParameter(format!(
            "raster dimensions {width_dots}x{height} must be non-zero"
        )));
    }

    let width_bytes = width_dots.div_ceil(8);
    let expected_len = width_bytes as usize * height as usize;
    if data.len() != expected_len {
        return Err(ProxyError::InvalidParameter(format!(
            "raster data length {} does not match {} bytes x {} rows",
            data.len(),
            width_bytes,
            height
        )));
    }

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
    cmd.extend_from_slice(data);
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let data = vec![0u8; 72 * 100];
        let cmd = raster(576, 100, &data).unwrap();
        assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0x00, 72, 0, 100, 0]);
        assert_eq!(cmd.len(), 8 + 72 * 100);
    }

    #[test]
    fn test_raster_rounds_width_up() {
        // 9 dots wide needs 2 bytes per row
        let cmd = raster(9, 1, &[0xFF, 0x80]).unwrap();
        assert_eq!(cmd[4], 2);
        assert_eq!(&cmd[8..], &[0xFF, 0x80]);
    }

    #[test]
    fn test_raster_tall_height_little_endian() {
        let data = vec![0u8; 500];
        let cmd = raster(8, 500, &data).unwrap();
        assert_eq!(cmd[6], 0xF4);
        assert_eq!(cmd[7], 0x01);
    }

    #[test]
    fn test_raster_rejects_length_mismatch() {
        assert!(matches!(
            raster(16, 2, &[0xFF; 3]),
            Err(ProxyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_raster_rejects_zero_dimensions() {
        assert!(raster(0, 1, &[]).is_err());
        assert!(raster(8, 0, &[]).is_err());
    }
}
