//! # Rendering Module
//!
//! Bitmap handling for the `<image>` element.
//!
//! ## Modules
//!
//! - [`dither`]: Threshold, Bayer 8x8 and Floyd-Steinberg binarization
//! - [`raster`]: Decode, validate and pack embedded bitmaps
//!
//! ## Usage Example
//!
//! ```
//! use posproxy::render::raster::{rasterize_raw, RasterOptions, RawFormat};
//!
//! let raster = rasterize_raw(&[0xF0; 4], 8, 4, RawFormat::Mono, &RasterOptions::default()).unwrap();
//! let command = raster.to_command().unwrap();
//! assert_eq!(&command[..4], &[0x1D, 0x76, 0x30, 0x00]);
//! ```

pub mod dither;
pub mod raster;

pub use dither::DitheringAlgorithm;
pub use raster::{RasterImage, RasterOptions, RawFormat, rasterize, rasterize_raw};
