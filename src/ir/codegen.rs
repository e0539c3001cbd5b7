//! # Code Generation
//!
//! The printer state machine: turns one [`Op`] into ESC/POS bytes, emitting
//! style commands only for aspects that actually change.
//!
//! ```text
//!   state ──┐
//!           ├──► apply ──► (state', bytes)
//!   op ─────┘
//! ```
//!
//! `apply` is a pure function. On error the caller keeps its old state and
//! nothing of the element reaches the output.

use super::ops::{Feed, ImageOp, Op, PrinterState};
use crate::error::ProxyError;
use crate::protocol::commands::{self, CutMode};
use crate::protocol::text;
use crate::render::raster::{self, RasterImage, RasterOptions};

/// Knobs that influence code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub raster: RasterOptions,
    /// Extra lines fed past the cutter for `cut type="feed"`.
    pub cut_feed_lines: u8,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::default(),
            cut_feed_lines: 0,
        }
    }
}

/// Apply one op to the printer state.
///
/// ## Example
///
/// ```
/// use posproxy::ir::{apply, EmitOptions, Op, PrinterState, TextStyle};
///
/// let op = Op::Text {
///     style: TextStyle { emphasize: Some(true), ..TextStyle::default() },
///     content: "Hi".into(),
/// };
/// let (state, bytes) = apply(&PrinterState::default(), &op, &EmitOptions::default()).unwrap();
/// assert!(state.emphasize);
/// assert_eq!(bytes, vec![0x1B, 0x45, 0x01, b'H', b'i']);
///
/// // Same element again: the style is already in place.
/// let (_, bytes) = apply(&state, &op, &EmitOptions::default()).unwrap();
/// assert_eq!(bytes, b"Hi");
/// ```
pub fn apply(
    state: &PrinterState,
    op: &Op,
    options: &EmitOptions,
) -> Result<(PrinterState, Vec<u8>), ProxyError> {
    match op {
        Op::Text { style, content } => {
            let next = style.resolve(state);
            let mut out = transition(state, &next)?;
            out.extend_from_slice(content.as_bytes());
            Ok((next, out))
        }

        Op::Feed(Feed::Lines(n)) => Ok((*state, commands::line_feed().repeat(*n as usize))),
        Op::Feed(Feed::Dots(n)) => Ok((*state, commands::feed_dots(*n))),

        Op::Cut { feed } => {
            let extra = feed.then_some(options.cut_feed_lines);
            Ok((*state, commands::cut(CutMode::Full, extra)))
        }

        Op::Pulse { pin, on_ms } => Ok((*state, commands::pulse(*pin, *on_ms)?)),

        Op::Image(image) => {
            let raster = rasterize(image, &options.raster)?;
            let next = PrinterState {
                alignment: image.alignment.unwrap_or(state.alignment),
                ..*state
            };
            let mut out = transition(state, &next)?;
            out.extend(raster.to_command()?);
            Ok((next, out))
        }

        Op::Unsupported(name) => Err(ProxyError::UnsupportedElement(name.clone())),
    }
}

/// Commands that move the printer from `from` to `to`.
///
/// Order: justification, font, emphasis, underline, reverse, smoothing, size.
pub fn transition(from: &PrinterState, to: &PrinterState) -> Result<Vec<u8>, ProxyError> {
    let mut out = Vec::new();

    if from.alignment != to.alignment {
        out.extend(text::align(to.alignment));
    }
    if from.font != to.font {
        out.extend(text::font(to.font));
    }
    if from.emphasize != to.emphasize {
        out.extend(text::emphasis(to.emphasize));
    }
    if from.underline != to.underline {
        out.extend(text::underline(to.underline));
    }
    if from.reverse != to.reverse {
        out.extend(text::reverse(to.reverse));
    }
    if from.smooth != to.smooth {
        out.extend(text::smoothing(to.smooth));
    }
    if (from.width_scale, from.height_scale) != (to.width_scale, to.height_scale) {
        out.extend(text::size(to.width_scale, to.height_scale)?);
    }

    Ok(out)
}

/// Decode the payload as a container image, falling back to a raw ePOS
/// raster when the declared geometry fits its length.
fn rasterize(image: &ImageOp, options: &RasterOptions) -> Result<RasterImage, ProxyError> {
    let container = raster::rasterize(&image.data, image.width, image.height, options);
    match (container, image.width, image.height) {
        (Ok(raster), _, _) => Ok(raster),
        (Err(ProxyError::ImageDecode(reason)), Some(width), Some(height))
            if image.data.len() == image.raw_format.expected_len(width, height) =>
        {
            tracing::debug!(%reason, width, height, "treating image payload as raw raster");
            raster::rasterize_raw(&image.data, width, height, image.raw_format, options)
        }
        (Err(e), _, _) => Err(e),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::TextStyle;
    use crate::protocol::commands::DrawerPin;
    use crate::protocol::text::{Alignment, Font};
    use crate::render::RawFormat;
    use pretty_assertions::assert_eq;

    fn text(style: TextStyle, content: &str) -> Op {
        Op::Text {
            style,
            content: content.into(),
        }
    }

    fn run(state: &PrinterState, op: &Op) -> (PrinterState, Vec<u8>) {
        apply(state, op, &EmitOptions::default()).unwrap()
    }

    #[test]
    fn test_plain_text_emits_only_content() {
        let (state, bytes) = run(&PrinterState::default(), &text(TextStyle::default(), "abc"));
        assert_eq!(state, PrinterState::default());
        assert_eq!(bytes, b"abc".to_vec());
    }

    #[test]
    fn test_text_is_idempotent() {
        let op = text(
            TextStyle {
                alignment: Some(Alignment::Center),
                emphasize: Some(true),
                height_scale: Some(2),
                ..TextStyle::default()
            },
            "RECEIPT",
        );
        let (state, first) = run(&PrinterState::default(), &op);
        let (again, second) = run(&state, &op);

        assert_eq!(
            first,
            [
                vec![0x1B, 0x61, 0x01],
                vec![0x1B, 0x45, 0x01],
                vec![0x1D, 0x21, 0x01],
                b"RECEIPT".to_vec(),
            ]
            .concat()
        );
        assert_eq!(second, b"RECEIPT".to_vec());
        assert_eq!(again, state);
    }

    #[test]
    fn test_style_persists_until_changed() {
        let bold = text(
            TextStyle {
                emphasize: Some(true),
                ..TextStyle::default()
            },
            "A",
        );
        let (state, _) = run(&PrinterState::default(), &bold);
        let (state, bytes) = run(&state, &text(TextStyle::default(), "B"));
        assert!(state.emphasize);
        assert_eq!(bytes, b"B".to_vec());

        let off = text(
            TextStyle {
                emphasize: Some(false),
                ..TextStyle::default()
            },
            "C",
        );
        let (state, bytes) = run(&state, &off);
        assert!(!state.emphasize);
        assert_eq!(bytes, vec![0x1B, 0x45, 0x00, b'C']);
    }

    #[test]
    fn test_transition_order() {
        let to = PrinterState {
            font: Font::B,
            width_scale: 2,
            height_scale: 3,
            alignment: Alignment::Right,
            emphasize: true,
            underline: true,
            reverse: true,
            smooth: true,
        };
        let bytes = transition(&PrinterState::default(), &to).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x1B, 0x61, 0x02, // align right
                0x1B, 0x4D, 0x01, // font B
                0x1B, 0x45, 0x01, // emphasis
                0x1B, 0x2D, 0x01, // underline
                0x1D, 0x42, 0x01, // reverse
                0x1D, 0x62, 0x01, // smoothing
                0x1D, 0x21, 0x12, // size 2x3
            ]
        );
    }

    #[test]
    fn test_invalid_scale_leaves_state() {
        let state = PrinterState::default();
        let op = text(
            TextStyle {
                width_scale: Some(9),
                emphasize: Some(true),
                ..TextStyle::default()
            },
            "x",
        );
        assert!(matches!(
            apply(&state, &op, &EmitOptions::default()),
            Err(ProxyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_feed_lines() {
        let state = PrinterState::default();
        assert_eq!(run(&state, &Op::Feed(Feed::Lines(2))).1, vec![0x0A, 0x0A]);
        assert_eq!(run(&state, &Op::Feed(Feed::Lines(1))).1, vec![0x0A]);
        assert!(run(&state, &Op::Feed(Feed::Lines(0))).1.is_empty());
        assert_eq!(run(&state, &Op::Feed(Feed::Dots(40))).1, vec![0x1B, 0x4A, 40]);
    }

    #[test]
    fn test_cut() {
        let state = PrinterState::default();
        assert_eq!(run(&state, &Op::Cut { feed: false }).1, vec![0x1D, 0x56, 0x00]);

        let options = EmitOptions {
            cut_feed_lines: 3,
            ..EmitOptions::default()
        };
        let (_, bytes) = apply(&state, &Op::Cut { feed: true }, &options).unwrap();
        assert_eq!(bytes, vec![0x1D, 0x56, 0x41, 0x03]);
    }

    #[test]
    fn test_pulse() {
        let op = Op::Pulse {
            pin: DrawerPin::Pin2,
            on_ms: 100,
        };
        assert_eq!(
            run(&PrinterState::default(), &op).1,
            vec![0x1B, 0x70, 0x00, 50, 50]
        );
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            apply(
                &PrinterState::default(),
                &Op::Unsupported("barcode".into()),
                &EmitOptions::default()
            ),
            Err(ProxyError::UnsupportedElement(name)) if name == "barcode"
        ));
    }

    #[test]
    fn test_raw_image_with_alignment() {
        let op = Op::Image(ImageOp {
            alignment: Some(Alignment::Center),
            width: Some(8),
            height: Some(2),
            raw_format: RawFormat::Mono,
            data: vec![0xFF, 0x81],
        });
        let (state, bytes) = run(&PrinterState::default(), &op);
        assert_eq!(state.alignment, Alignment::Center);
        assert_eq!(
            bytes,
            vec![
                0x1B, 0x61, 0x01, // center
                0x1D, 0x76, 0x30, 0x00, 1, 0, 2, 0, // GS v 0 header
                0xFF, 0x81,
            ]
        );
    }

    #[test]
    fn test_image_failure_keeps_alignment() {
        let op = Op::Image(ImageOp {
            alignment: Some(Alignment::Right),
            width: Some(8),
            height: Some(2),
            raw_format: RawFormat::Mono,
            data: vec![0x01, 0x02, 0x03],
        });
        assert!(matches!(
            apply(&PrinterState::default(), &op, &EmitOptions::default()),
            Err(ProxyError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_too_wide_raw_image() {
        let op = Op::Image(ImageOp {
            alignment: None,
            width: Some(640),
            height: Some(1),
            raw_format: RawFormat::Mono,
            data: vec![0; 80],
        });
        assert!(matches!(
            apply(&PrinterState::default(), &op, &EmitOptions::default()),
            Err(ProxyError::ImageTooLarge(_))
        ));
    }
}
