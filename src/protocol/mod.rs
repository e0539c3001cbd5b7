//! # ESC/POS Protocol Implementation
//!
//! This module provides low-level command builders for the ESC/POS protocol
//! spoken by Epson-compatible thermal receipt printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Device control (init, feed, cut, drawer pulse, end of job)
//! - [`text`]: Character formatting (justification, font, size, emphasis, ...)
//! - [`graphics`]: Raster bit images
//!
//! ## Usage Example
//!
//! ```
//! use posproxy::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::emphasis(true));
//! data.extend(b"RECEIPT");
//! data.extend(commands::line_feed());
//! data.extend(commands::cut(commands::CutMode::Full, Some(0)));
//! data.extend(commands::end_of_job());
//!
//! assert_eq!(&data[..2], &[0x1B, 0x40]);
//! assert_eq!(data.last(), Some(&0xFA));
//! ```
//!
//! All builders are pure and allocate a fresh `Vec<u8>`; none of them
//! tracks printer state.

pub mod commands;
pub mod graphics;
pub mod text;
