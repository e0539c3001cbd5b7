//! # Dithering
//!
//! Converts continuous-tone intensity buffers to the 1-bit rows the raster
//! command expects.
//!
//! Intensities use the printer's point of view: `0.0` is white paper and
//! `1.0` is a fully burned dot.
//!
//! ## Algorithms
//!
//! | Method | Speed | Quality | Artifacts |
//! |--------|-------|---------|-----------|
//! | Threshold | Fastest | Poor on photos | Banding |
//! | Bayer 8×8 | Fast | Good | Regular pattern |
//! | Floyd-Steinberg | Slower | Better | Noise, worms |
//!
//! ## The Bayer Matrix
//!
//! ```text
//!     0   1   2   3   4   5   6   7   (x mod 8)
//!   ┌───┬───┬───┬───┬───┬───┬───┬───┐
//! 0 │ 0 │32 │ 8 │40 │ 2 │34 │10 │42 │
//! 1 │48 │16 │56 │24 │50 │18 │58 │26 │
//! 2 │12 │44 │ 4 │36 │14 │46 │ 6 │38 │
//! 3 │60 │28 │52 │20 │62 │30 │54 │22 │
//! 4 │ 3 │35 │11 │43 │ 1 │33 │ 9 │41 │
//! 5 │51 │19 │59 │27 │49 │17 │57 │25 │
//! 6 │15 │47 │ 7 │39 │13 │45 │ 5 │37 │
//! 7 │63 │31 │55 │23 │61 │29 │53 │21 │
//!   └───┴───┴───┴───┴───┴───┴───┴───┘
//! ```
//!
//! Values are normalized to `(value + 0.5) / 64`, so pure white never
//! prints and pure black always does.
//!
//! ## Usage Example
//!
//! ```
//! use posproxy::render::dither::{self, DitheringAlgorithm};
//!
//! // 50% gray, 16×2 pixels
//! let intensity = vec![0.5; 16 * 2];
//! let packed = dither::dither(&intensity, 16, 2, DitheringAlgorithm::Bayer);
//! assert_eq!(packed.len(), 2 * 2);
//!
//! let row = [true, true, false, false, true, false, true, false];
//! assert_eq!(dither::pack_row(&row), vec![0b11001010]);
//! ```

use std::fmt;
use std::str::FromStr;

/// Bayer 8x8 dithering matrix (values 0-63, each exactly once).
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Intensity above which a plain threshold prints a dot.
pub const THRESHOLD: f32 = 0.5;

/// How multi-level images are reduced to black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitheringAlgorithm {
    /// Fixed 50% threshold, no halftoning.
    Threshold,
    /// Ordered 8×8 Bayer dithering.
    Bayer,
    /// Floyd-Steinberg error diffusion.
    #[default]
    FloydSteinberg,
}

impl FromStr for DitheringAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "threshold" => Ok(Self::Threshold),
            "bayer" => Ok(Self::Bayer),
            "floyd-steinberg" | "floyd_steinberg" | "fs" => Ok(Self::FloydSteinberg),
            other => Err(format!(
                "unknown dithering '{other}' (expected threshold, bayer or floyd-steinberg)"
            )),
        }
    }
}

impl fmt::Display for DitheringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Threshold => "threshold",
            Self::Bayer => "bayer",
            Self::FloydSteinberg => "floyd-steinberg",
        };
        f.write_str(name)
    }
}

/// Get the Bayer threshold for a pixel position, in `(0, 1)`.
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0
}

/// Ordered-dither decision for one pixel.
///
/// ```
/// use posproxy::render::dither::should_print;
///
/// assert!(should_print(0, 0, 1.0));
/// assert!(!should_print(0, 0, 0.0));
/// ```
#[inline]
pub fn should_print(x: usize, y: usize, intensity: f32) -> bool {
    intensity > threshold(x, y)
}

/// Pack a row of boolean pixel values into bytes.
///
/// - Bit 7 (MSB) = leftmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// If the row length is not a multiple of 8, the last byte is padded with
/// zeros (white) on the right.
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    bytes
}

/// Dither a row-major intensity buffer and pack it for the raster command.
///
/// Returns `ceil(width / 8) * height` bytes.
pub fn dither(
    intensity: &[f32],
    width: usize,
    height: usize,
    algorithm: DitheringAlgorithm,
) -> Vec<u8> {
    debug_assert_eq!(intensity.len(), width * height);

    let dots: Vec<bool> = match algorithm {
        DitheringAlgorithm::Threshold => intensity.iter().map(|&v| v > THRESHOLD).collect(),
        DitheringAlgorithm::Bayer => intensity
            .iter()
            .enumerate()
            .map(|(i, &v)| should_print(i % width, i / width, v))
            .collect(),
        DitheringAlgorithm::FloydSteinberg => floyd_steinberg(intensity, width, height),
    };

    pack_rows(&dots, width, height)
}

/// Pack a row-major boolean grid.
pub fn pack_rows(dots: &[bool], width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width.div_ceil(8) * height);
    if width == 0 {
        return data;
    }
    for row in dots.chunks(width).take(height) {
        data.extend(pack_row(row));
    }
    data
}

/// Floyd-Steinberg error diffusion.
///
/// ```text
///          *    7/16
///   3/16  5/16  1/16
/// ```
fn floyd_steinberg(intensity: &[f32], width: usize, height: usize) -> Vec<bool> {
    let mut buf = intensity.to_vec();
    let mut dots = vec![false; width * height];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = buf[idx];
            let on = old > THRESHOLD;
            dots[idx] = on;
            let err = old - if on { 1.0 } else { 0.0 };
            if err == 0.0 {
                continue;
            }

            if x + 1 < width {
                buf[idx + 1] += err * 7.0 / 16.0;
            }
            if y + 1 < height {
                let below = idx + width;
                if x > 0 {
                    buf[below - 1] += err * 3.0 / 16.0;
                }
                buf[below] += err * 5.0 / 16.0;
                if x + 1 < width {
                    buf[below + 1] += err * 1.0 / 16.0;
                }
            }
        }
    }

    dots
}

// ============================================================================
// TESTS
// ============================================================================
