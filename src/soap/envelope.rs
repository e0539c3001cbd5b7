//! # SOAP Envelope Extraction
//!
//! Lifts the children of a SOAP `Body` into generic [`Element`] trees.
//!
//! ```text
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Header>...</s:Header>            ← tolerated, ignored
//!   <s:Body>
//!     <text align="center">Hi</text>    ← Element { name: "text", ... }
//!     <cut type="feed"/>                ← Element { name: "cut", ... }
//!   </s:Body>
//! </s:Envelope>
//! ```
//!
//! Element and attribute names are reduced to their local part, so
//! `s:Body`, `soapenv:Body` and a default-namespaced `Body` are the same
//! thing. Namespace declarations are dropped from the attribute map.
//!
//! Nothing here knows about printers.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ProxyError;

/// One XML element with its attributes, direct text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local tag name (prefix stripped).
    pub name: String,
    /// Attributes by local name. The last duplicate wins.
    pub attributes: BTreeMap<String, String>,
    /// Concatenated direct text and CDATA, unescaped, not trimmed.
    pub content: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter, handy in tests.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style content setter.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Attribute value by local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Extract the ordered children of the SOAP `Body`.
///
/// ## Errors
///
/// - [`ProxyError::MalformedDocument`]: not well-formed XML, root is not
///   `Envelope`, or there is no `Body`
/// - [`ProxyError::EmptyBody`]: `Body` has no child elements
///
/// ## Example
///
/// ```
/// use posproxy::soap::extract_body;
///
/// let xml = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
///   <s:Body><text em="true">Hi</text><cut/></s:Body>
/// </s:Envelope>"#;
///
/// let elements = extract_body(xml).unwrap();
/// assert_eq!(elements.len(), 2);
/// assert_eq!(elements[0].attr("em"), Some("true"));
/// assert_eq!(elements[0].content, "Hi");
/// ```
pub fn extract_body(bytes: &[u8]) -> Result<Vec<Element>, ProxyError> {
    let envelope = parse_document(bytes)?;
    if envelope.name != "Envelope" {
        return Err(ProxyError::MalformedDocument(format!(
            "root element is <{}>, expected <Envelope>",
            envelope.name
        )));
    }

    let body = envelope
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| ProxyError::MalformedDocument("Envelope has no Body".to_string()))?;

    if body.children.is_empty() {
        return Err(ProxyError::EmptyBody);
    }
    Ok(body.children)
}

/// Parse a whole document into its root [`Element`].
pub fn parse_document(bytes: &[u8]) -> Result<Element, ProxyError> {
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    let malformed = |reader: &Reader<&[u8]>, msg: String| {
        ProxyError::MalformedDocument(format!("{msg} at byte {}", reader.buffer_position()))
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(malformed(&reader, "content after root element".into()));
                }
                let element = open_element(&start).map_err(|msg| malformed(&reader, msg))?;
                stack.push(element);
            }
            Event::Empty(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(malformed(&reader, "content after root element".into()));
                }
                let element = open_element(&start).map_err(|msg| malformed(&reader, msg))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                // quick-xml has already matched the end tag against its start
                if let Some(element) = stack.pop() {
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| malformed(&reader, e.to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.content.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed(&reader, "text outside root element".into())),
                }
            }
            Event::CData(cdata) => {
                let text = std::str::from_utf8(&cdata)
                    .map_err(|e| malformed(&reader, format!("CDATA is not UTF-8: {e}")))?;
                match stack.last_mut() {
                    Some(parent) => parent.content.push_str(text),
                    None => return Err(malformed(&reader, "CDATA outside root element".into())),
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ProxyError::MalformedDocument(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ProxyError::MalformedDocument("document has no root element".to_string()))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, String> {
    let name = utf8(start.local_name().as_ref(), "element name")?;
    let mut element = Element::new(name);

    let mut attributes = start.attributes();
    attributes.with_checks(false);
    for attr in attributes {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = utf8(attr.key.local_name().as_ref(), "attribute name")?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.insert(key, value.into_owned());
    }

    Ok(element)
}

fn close_element(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| format!("{what} is not UTF-8: {e}"))
}
