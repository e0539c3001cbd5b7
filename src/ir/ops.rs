//! # IR Opcodes
//!
//! Typed form of the ePOS-Print elements the proxy understands.
//!
//! ## Design Philosophy
//!
//! The SOAP layer hands over loosely typed [`Element`](crate::soap::Element)s.
//! [`convert`](super::convert) validates their attributes once and produces an
//! [`Op`]; from then on nothing deals with strings:
//!
//! ```text
//! Element (name + attribute map) → Op (validated) → codegen → ESC/POS bytes
//! ```
//!
//! Style fields on [`TextStyle`] are `Option`s: `None` means "leave as is",
//! so formatting carries over from one element to the next.

use crate::protocol::commands::DrawerPin;
use crate::protocol::text::{Alignment, Font};
use crate::render::RawFormat;

/// Formatting the printer is currently in.
///
/// One value per job. [`Default`] matches the state right after `ESC @`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterState {
    pub font: Font,
    pub width_scale: u8,
    pub height_scale: u8,
    pub alignment: Alignment,
    pub emphasize: bool,
    pub underline: bool,
    pub reverse: bool,
    pub smooth: bool,
}

impl Default for PrinterState {
    fn default() -> Self {
        Self {
            font: Font::A,
            width_scale: 1,
            height_scale: 1,
            alignment: Alignment::Left,
            emphasize: false,
            underline: false,
            reverse: false,
            smooth: false,
        }
    }
}

/// Requested formatting for one `<text>` element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub alignment: Option<Alignment>,
    pub font: Option<Font>,
    pub emphasize: Option<bool>,
    pub underline: Option<bool>,
    pub reverse: Option<bool>,
    pub smooth: Option<bool>,
    pub width_scale: Option<u8>,
    pub height_scale: Option<u8>,
}

impl TextStyle {
    /// State after applying this style on top of `state`.
    pub fn resolve(&self, state: &PrinterState) -> PrinterState {
        PrinterState {
            font: self.font.unwrap_or(state.font),
            width_scale: self.width_scale.unwrap_or(state.width_scale),
            height_scale: self.height_scale.unwrap_or(state.height_scale),
            alignment: self.alignment.unwrap_or(state.alignment),
            emphasize: self.emphasize.unwrap_or(state.emphasize),
            underline: self.underline.unwrap_or(state.underline),
            reverse: self.reverse.unwrap_or(state.reverse),
            smooth: self.smooth.unwrap_or(state.smooth),
        }
    }
}

/// Paper feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// `line="n"`: n line feeds.
    Lines(u8),
    /// `unit="n"`: feed n dots.
    Dots(u8),
}

/// Embedded bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOp {
    pub alignment: Option<Alignment>,
    /// Declared width in pixels.
    pub width: Option<u32>,
    /// Declared height in pixels.
    pub height: Option<u32>,
    /// Raw layout used when `data` is not an image container.
    pub raw_format: RawFormat,
    /// Base64-decoded payload.
    pub data: Vec<u8>,
}

/// One validated element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Styled text. Content is sent as-is, newlines included.
    Text { style: TextStyle, content: String },

    Feed(Feed),

    /// Cut paper. `feed: true` advances to the cutter first.
    Cut { feed: bool },

    /// Cash drawer kick.
    Pulse { pin: DrawerPin, on_ms: u16 },

    Image(ImageOp),

    /// Element name with no mapping.
    Unsupported(String),
}

impl Op {
    /// Short name for logs.
    pub fn kind(&self) -> &str {
        match self {
            Op::Text { .. } => "text",
            Op::Feed(_) => "feed",
            Op::Cut { .. } => "cut",
            Op::Pulse { .. } => "pulse",
            Op::Image(_) => "image",
            Op::Unsupported(name) => name,
        }
    }
}
