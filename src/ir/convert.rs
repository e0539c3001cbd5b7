//! # Element Conversion
//!
//! Validates ePOS-Print attributes and turns an [`Element`] into an [`Op`].
//!
//! ## Recognised Elements
//!
//! | Element | Attributes |
//! |---------|------------|
//! | `text` | `align`, `font`, `em`, `ul`, `reverse`, `smooth`, `dw`, `dh`, `width`, `height` |
//! | `feed` | `line` (default 1), `unit` |
//! | `cut` | `type` (`feed` or anything else) |
//! | `pulse` | `drawer` (`drawer_1`, `drawer_2`), `time` (`pulse_100` .. `pulse_500`) |
//! | `image` | `width`, `height`, `align`, `mode` (`mono`, `gray16`); content is base64 |
//!
//! Unknown attributes are ignored. Known attributes with bad values make the
//! whole element fail with [`ProxyError::InvalidParameter`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::ops::{Feed, ImageOp, Op, TextStyle};
use crate::error::ProxyError;
use crate::protocol::commands::DrawerPin;
use crate::protocol::text::{Alignment, Font, MAX_SCALE};
use crate::render::RawFormat;
use crate::soap::Element;

impl Op {
    /// Validate an element and build its op.
    ///
    /// Unknown element names become [`Op::Unsupported`]; they only fail once
    /// they reach code generation.
    pub fn from_element(element: &Element) -> Result<Op, ProxyError> {
        match element.name.as_str() {
            "text" => text(element),
            "feed" => feed(element),
            "cut" => Ok(Op::Cut {
                feed: element.attr("type") == Some("feed"),
            }),
            "pulse" => pulse(element),
            "image" => image(element),
            other => Ok(Op::Unsupported(other.to_string())),
        }
    }
}

fn text(element: &Element) -> Result<Op, ProxyError> {
    let mut style = TextStyle {
        alignment: opt(element, "align", alignment)?,
        font: opt(element, "font", font)?,
        emphasize: opt(element, "em", boolean)?,
        underline: opt(element, "ul", boolean)?,
        reverse: opt(element, "reverse", boolean)?,
        smooth: opt(element, "smooth", boolean)?,
        width_scale: opt(element, "dw", double)?,
        height_scale: opt(element, "dh", double)?,
    };

    // explicit scales win over dw/dh
    if let Some(width) = opt(element, "width", scale)? {
        style.width_scale = Some(width);
    }
    if let Some(height) = opt(element, "height", scale)? {
        style.height_scale = Some(height);
    }

    Ok(Op::Text {
        style,
        content: element.content.clone(),
    })
}

fn feed(element: &Element) -> Result<Op, ProxyError> {
    let line = opt(element, "line", byte)?;
    let unit = opt(element, "unit", byte)?;
    Ok(match (line, unit) {
        (Some(lines), _) => Op::Feed(Feed::Lines(lines)),
        (None, Some(dots)) => Op::Feed(Feed::Dots(dots)),
        (None, None) => Op::Feed(Feed::Lines(1)),
    })
}

fn pulse(element: &Element) -> Result<Op, ProxyError> {
    let pin = opt(element, "drawer", drawer)?.unwrap_or_default();
    let on_ms = opt(element, "time", pulse_time)?.unwrap_or(100);
    Ok(Op::Pulse { pin, on_ms })
}

fn image(element: &Element) -> Result<Op, ProxyError> {
    let encoded: String = element
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if encoded.is_empty() {
        return Err(ProxyError::ImageDecode("image has no data".to_string()));
    }
    let data = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ProxyError::ImageDecode(format!("invalid base64: {e}")))?;

    Ok(Op::Image(ImageOp {
        alignment: opt(element, "align", alignment)?,
        width: opt(element, "width", dimension)?,
        height: opt(element, "height", dimension)?,
        raw_format: opt(element, "mode", raw_format)?.unwrap_or_default(),
        data,
    }))
}

// ============================================================================
// ATTRIBUTE PARSERS
// ============================================================================

fn opt<T>(
    element: &Element,
    key: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, ProxyError> {
    match element.attr(key) {
        None => Ok(None),
        Some(value) => parse(value).map(Some).ok_or_else(|| {
            ProxyError::InvalidParameter(format!(
                "<{}> attribute {key}=\"{value}\" is not valid",
                element.name
            ))
        }),
    }
}

fn boolean(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn double(value: &str) -> Option<u8> {
    boolean(value).map(|on| if on { 2 } else { 1 })
}

fn scale(value: &str) -> Option<u8> {
    value
        .parse()
        .ok()
        .filter(|s| (1..=MAX_SCALE).contains(s))
}

fn byte(value: &str) -> Option<u8> {
    value.parse().ok()
}

fn dimension(value: &str) -> Option<u32> {
    value.parse().ok().filter(|&d| d > 0)
}

fn alignment(value: &str) -> Option<Alignment> {
    match value {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        _ => None,
    }
}

fn font(value: &str) -> Option<Font> {
    match value {
        "font_a" | "a" => Some(Font::A),
        "font_b" | "b" => Some(Font::B),
        "font_c" | "c" => Some(Font::C),
        _ => None,
    }
}

fn drawer(value: &str) -> Option<DrawerPin> {
    match value {
        "drawer_1" => Some(DrawerPin::Pin2),
        "drawer_2" => Some(DrawerPin::Pin5),
        _ => None,
    }
}

fn pulse_time(value: &str) -> Option<u16> {
    value
        .strip_prefix("pulse_")
        .and_then(|ms| ms.parse().ok())
        .filter(|ms| [100, 200, 300, 400, 500].contains(ms))
}

fn raw_format(value: &str) -> Option<RawFormat> {
    match value {
        "mono" => Some(RawFormat::Mono),
        "gray16" => Some(RawFormat::Gray16),
        _ => None,
    }
}
