//! # Image Rasterizer
//!
//! Turns an embedded bitmap into the packed 1-bit rows of `GS v 0`.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ──► header size check ──► decode ──► alpha over white ──► luma
//!                                                                   │
//!        RasterImage ◄── pack MSB-first ◄── threshold / dither ◄────┘
//! ```
//!
//! Dimensions are read from the header and checked before any pixel
//! buffer is allocated.
//!
//! Sources with at most two distinct luma values (line art, already
//! monochrome logos) are thresholded directly; anything with more levels
//! goes through the configured [`DitheringAlgorithm`].
//!
//! Two kinds of payload are accepted:
//!
//! - any container the `image` crate can sniff (PNG, JPEG, BMP, GIF, ...),
//!   via [`rasterize`]
//! - raw ePOS rasters whose geometry comes from the element attributes,
//!   via [`rasterize_raw`]

use std::io::Cursor;

use image::error::ImageError;
use image::{DynamicImage, ImageReader, Limits};

use super::dither::{self, DitheringAlgorithm};
use crate::error::ProxyError;
use crate::printer::PrinterConfig;
use crate::protocol::graphics;

/// How far decoded dimensions may drift from the declared ones.
pub const DIMENSION_TOLERANCE: u32 = 1;

/// Limits and halftoning used while rasterizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Widest image the printer accepts, in dots.
    pub max_width: u32,
    /// Tallest image a single raster command accepts, in rows.
    pub max_height: u32,
    /// Halftoning for multi-level sources.
    pub dithering: DitheringAlgorithm,
}

impl RasterOptions {
    pub fn for_printer(printer: &PrinterConfig, dithering: DitheringAlgorithm) -> Self {
        Self {
            max_width: printer.width_dots as u32,
            max_height: printer.max_raster_height as u32,
            dithering,
        }
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::for_printer(&PrinterConfig::default(), DitheringAlgorithm::default())
    }
}

/// Packed monochrome bitmap ready for the raster command.
///
/// Invariant: `bits.len() == bytes_per_row * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub bits: Vec<u8>,
}

impl RasterImage {
    /// Encode as `GS v 0` with header.
    pub fn to_command(&self) -> Result<Vec<u8>, ProxyError> {
        let width = u16::try_from(self.width)
            .map_err(|_| ProxyError::ImageTooLarge(format!("width {}", self.width)))?;
        let height = u16::try_from(self.height)
            .map_err(|_| ProxyError::ImageTooLarge(format!("height {}", self.height)))?;
        graphics::raster(width, height, &self.bits)
    }
}

/// Layout of a raw ePOS raster payload (the `mode` attribute of `<image>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawFormat {
    /// 1 bit per pixel, MSB first, 1 = black.
    #[default]
    Mono,
    /// 4 bits per pixel, high nibble first, 0 = black, 15 = white.
    Gray16,
}

impl RawFormat {
    /// Payload size for a `width`×`height` raster.
    pub fn expected_len(self, width: u32, height: u32) -> usize {
        let bits_per_pixel = match self {
            RawFormat::Mono => 1,
            RawFormat::Gray16 => 4,
        };
        (width as usize * bits_per_pixel).div_ceil(8) * height as usize
    }
}

// ============================================================================
// CONTAINER IMAGES
// ============================================================================

/// Decode a bitmap container and convert it to a packed raster.
///
/// ## Errors
///
/// - [`ProxyError::ImageDecode`]: undecodable bytes, zero-sized images, or
///   decoded dimensions off by more than [`DIMENSION_TOLERANCE`] from the
///   declared ones
/// - [`ProxyError::ImageTooLarge`]: wider or taller than `options` allow,
///   judged from the header alone
///
/// ## Example
///
/// ```
/// use std::io::Cursor;
/// use image::{GrayImage, Luma};
/// use posproxy::render::raster::{rasterize, RasterOptions};
///
/// let img = GrayImage::from_pixel(10, 2, Luma([255]));
/// let mut png = Vec::new();
/// img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
///
/// let raster = rasterize(&png, Some(10), Some(2), &RasterOptions::default()).unwrap();
/// assert_eq!(raster.bits, vec![0; 4]);
/// ```
pub fn rasterize(
    bytes: &[u8],
    declared_width: Option<u32>,
    declared_height: Option<u32>,
    options: &RasterOptions,
) -> Result<RasterImage, ProxyError> {
    // header only: nothing is allocated for images we would reject
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(decode_error)?;
    check_declared("width", width, declared_width)?;
    check_declared("height", height, declared_height)?;
    check_limits(width, height, options)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(options.max_width);
    limits.max_image_height = Some(options.max_height);
    let mut decoder = reader(bytes)?;
    decoder.limits(limits);
    let decoded = decoder.decode().map_err(decode_error)?;

    let luma = composite_luma(&decoded);
    Ok(from_luma(&luma, decoded.width(), decoded.height(), options.dithering))
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ProxyError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProxyError::ImageDecode(format!("cannot read bitmap: {e}")))
}

fn decode_error(e: ImageError) -> ProxyError {
    match e {
        ImageError::Limits(limit) => ProxyError::ImageTooLarge(limit.to_string()),
        other => ProxyError::ImageDecode(format!("cannot decode bitmap: {other}")),
    }
}

fn check_declared(axis: &str, actual: u32, declared: Option<u32>) -> Result<(), ProxyError> {
    match declared {
        Some(expected) if actual.abs_diff(expected) > DIMENSION_TOLERANCE => {
            Err(ProxyError::ImageDecode(format!(
                "decoded {axis} {actual} does not match declared {expected}"
            )))
        }
        _ => Ok(()),
    }
}

fn check_limits(width: u32, height: u32, options: &RasterOptions) -> Result<(), ProxyError> {
    if width == 0 || height == 0 {
        return Err(ProxyError::ImageDecode(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    if width > options.max_width {
        return Err(ProxyError::ImageTooLarge(format!(
            "width {width} exceeds printable {} dots",
            options.max_width
        )));
    }
    if height > options.max_height {
        return Err(ProxyError::ImageTooLarge(format!(
            "height {height} exceeds {} rows",
            options.max_height
        )));
    }
    Ok(())
}

/// Rec. 601 luma with alpha composited over white paper.
fn composite_luma(image: &DynamicImage) -> Vec<u8> {
    image
        .to_rgba8()
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
            let alpha = a as u32;
            ((luma * alpha + 255 * (255 - alpha)) / 255) as u8
        })
        .collect()
}

/// Threshold two-level sources, dither everything else.
fn from_luma(luma: &[u8], width: u32, height: u32, algorithm: DitheringAlgorithm) -> RasterImage {
    let (w, h) = (width as usize, height as usize);

    let bits = if luma_levels(luma) <= 2 {
        let dots: Vec<bool> = luma.iter().map(|&l| l < 128).collect();
        dither::pack_rows(&dots, w, h)
    } else {
        let intensity: Vec<f32> = luma.iter().map(|&l| 1.0 - l as f32 / 255.0).collect();
        dither::dither(&intensity, w, h, algorithm)
    };

    RasterImage {
        width,
        height,
        bytes_per_row: w.div_ceil(8),
        bits,
    }
}

fn luma_levels(luma: &[u8]) -> usize {
    let mut seen = [false; 256];
    let mut levels = 0;
    for &l in luma {
        if !seen[l as usize] {
            seen[l as usize] = true;
            levels += 1;
            if levels > 2 {
                break;
            }
        }
    }
    levels
}

// ============================================================================
// RAW ePOS RASTERS
// ============================================================================

/// Interpret a payload as a raw ePOS raster of the declared geometry.
///
/// The length must match [`RawFormat::expected_len`] exactly.
pub fn rasterize_raw(
    bytes: &[u8],
    width: u32,
    height: u32,
    format: RawFormat,
    options: &RasterOptions,
) -> Result<RasterImage, ProxyError> {
    check_limits(width, height, options)?;

    let expected = format.expected_len(width, height);
    if bytes.len() != expected {
        return Err(ProxyError::ImageDecode(format!(
            "{} bytes is not a {width}x{height} {format:?} raster ({expected} bytes)",
            bytes.len()
        )));
    }

    match format {
        RawFormat::Mono => Ok(RasterImage {
            width,
            height,
            bytes_per_row: (width as usize).div_ceil(8),
            bits: mask_padding(bytes, width as usize),
        }),
        RawFormat::Gray16 => {
            let row_bytes = (width as usize * 4).div_ceil(8);
            let mut luma = Vec::with_capacity(width as usize * height as usize);
            for row in bytes.chunks(row_bytes) {
                for x in 0..width as usize {
                    let byte = row[x / 2];
                    let nibble = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                    luma.push(nibble * 17);
                }
            }
            Ok(from_luma(&luma, width, height, options.dithering))
        }
    }
}

/// Clear the unused low bits of each row's last byte.
fn mask_padding(bytes: &[u8], width: usize) -> Vec<u8> {
    let mut bits = bytes.to_vec();
    let spare = (8 - width % 8) % 8;
    if spare > 0 {
        let mask = 0xFFu8 << spare;
        for row in bits.chunks_mut(width.div_ceil(8)) {
            if let Some(last) = row.last_mut() {
                *last &= mask;
            }
        }
    }
    bits
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn black_dots(raster: &RasterImage) -> u32 {
        raster.bits.iter().map(|b| b.count_ones()).sum()
    }

    fn gray(width: u32, height: u32, value: u8) -> Vec<u8> {
        png(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            width,
            height,
            Luma([value]),
        )))
    }

    #[test]
    fn test_all_white_is_all_zero() {
        let raster = rasterize(&gray(13, 5, 255), None, None, &RasterOptions::default()).unwrap();
        assert_eq!(raster.bytes_per_row, 2);
        assert_eq!(raster.bits, vec![0; 2 * 5]);
        assert_eq!(black_dots(&raster), 0);
    }

    #[test]
    fn test_all_black_pads_row_end() {
        let raster = rasterize(&gray(10, 1, 0), None, None, &RasterOptions::default()).unwrap();
        assert_eq!(raster.bits, vec![0xFF, 0xC0]);
    }

    #[test]
    fn test_two_level_is_thresholded() {
        let mut img = GrayImage::from_pixel(8, 1, Luma([255]));
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(7, 0, Luma([0]));
        let raster = rasterize(
            &png(DynamicImage::ImageLuma8(img)),
            Some(8),
            Some(1),
            &RasterOptions::default(),
        )
        .unwrap();
        assert_eq!(raster.bits, vec![0b1000_0001]);
    }

    #[test]
    fn test_gradient_is_dithered() {
        let img = GrayImage::from_fn(64, 16, |x, _| Luma([(x * 4) as u8]));
        let raster = rasterize(
            &png(DynamicImage::ImageLuma8(img)),
            None,
            None,
            &RasterOptions::default(),
        )
        .unwrap();
        let dots = black_dots(&raster);
        // roughly half the area is dark
        assert!((300..=724).contains(&dots), "dots {dots}");
    }

    #[test]
    fn test_transparent_composites_to_white() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([0, 0, 0, 0]));
        let raster = rasterize(
            &png(DynamicImage::ImageRgba8(img)),
            None,
            None,
            &RasterOptions::default(),
        )
        .unwrap();
        assert_eq!(raster.bits, vec![0, 0]);
    }

    #[test]
    fn test_dimension_tolerance() {
        let opts = RasterOptions::default();
        assert!(rasterize(&gray(10, 10, 255), Some(11), Some(9), &opts).is_ok());
        assert!(matches!(
            rasterize(&gray(10, 10, 255), Some(12), Some(10), &opts),
            Err(ProxyError::ImageDecode(_))
        ));
        assert!(matches!(
            rasterize(&gray(1, 1, 255), Some(256), Some(256), &opts),
            Err(ProxyError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_too_wide_rejected() {
        let opts = RasterOptions::for_printer(&PrinterConfig::EPSON_58MM, DitheringAlgorithm::Bayer);
        assert!(matches!(
            rasterize(&gray(400, 1, 255), None, None, &opts),
            Err(ProxyError::ImageTooLarge(_))
        ));
    }

    #[test]
    fn test_too_tall_rejected() {
        let opts = RasterOptions {
            max_height: 4,
            ..RasterOptions::default()
        };
        assert!(matches!(
            rasterize(&gray(8, 5, 255), None, None, &opts),
            Err(ProxyError::ImageTooLarge(_))
        ));
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let crc = crc32(&[&kind[..], data].concat());
        out.extend_from_slice(&crc.to_be_bytes());
        out
    }

    /// PNG whose header claims `width`×`height` 8-bit gray, without pixel data.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend(chunk(b"IHDR", &ihdr));
        // empty zlib stream
        png.extend(chunk(b"IDAT", &[0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]));
        png.extend(chunk(b"IEND", &[]));
        png
    }

    #[test]
    fn test_huge_header_rejected_before_decode() {
        let opts = RasterOptions::default();
        assert!(matches!(
            rasterize(&png_header(30_000, 30_000), None, None, &opts),
            Err(ProxyError::ImageTooLarge(_))
        ));
        assert!(matches!(
            rasterize(&png_header(20_000, 1), None, None, &opts),
            Err(ProxyError::ImageTooLarge(_))
        ));
        assert!(matches!(
            rasterize(&png_header(8, 5_000), None, None, &opts),
            Err(ProxyError::ImageTooLarge(_))
        ));
    }

    #[test]
    fn test_declared_mismatch_checked_from_header() {
        assert!(matches!(
            rasterize(&png_header(30_000, 30_000), Some(64), Some(64), &RasterOptions::default()),
            Err(ProxyError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            rasterize(b"not an image", None, None, &RasterOptions::default()),
            Err(ProxyError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_raw_mono_masks_padding() {
        let raster = rasterize_raw(
            &[0xFF, 0xFF, 0x00, 0xFF],
            12,
            2,
            RawFormat::Mono,
            &RasterOptions::default(),
        )
        .unwrap();
        assert_eq!(raster.bits, vec![0xFF, 0xF0, 0x00, 0xF0]);
    }

    #[test]
    fn test_raw_length_mismatch() {
        assert!(matches!(
            rasterize_raw(&[0xFF; 3], 8, 2, RawFormat::Mono, &RasterOptions::default()),
            Err(ProxyError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_raw_gray16_black_and_white() {
        // 0 = black, F = white
        let raster = rasterize_raw(
            &[0x0F, 0x0F, 0x0F, 0x0F],
            8,
            1,
            RawFormat::Gray16,
            &RasterOptions::default(),
        )
        .unwrap();
        assert_eq!(raster.bits, vec![0b1010_1010]);
    }

    #[test]
    fn test_to_command_header() {
        let raster = rasterize_raw(&[0xAA], 8, 1, RawFormat::Mono, &RasterOptions::default())
            .unwrap();
        assert_eq!(
            raster.to_command().unwrap(),
            vec![0x1D, 0x76, 0x30, 0x00, 1, 0, 1, 0, 0xAA]
        );
    }
}
