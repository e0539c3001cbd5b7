//! # Error Types
//!
//! This module defines the error type used throughout the posproxy library.
//!
//! Errors fall into three stages, and the stage decides how a job reacts:
//!
//! | Stage | Variants | Effect on the job |
//! |-------|----------|-------------------|
//! | Extraction | `MalformedDocument`, `EmptyBody` | SOAP fault, nothing written |
//! | Element | `UnsupportedElement`, `InvalidParameter`, `ImageDecode`, `ImageTooLarge` | element skipped, job continues |
//! | Transport | `DeviceWriteTimeout`, `Transport`, `Io` | SOAP fault after encoding |

use std::time::Duration;

use thiserror::Error;

/// Main error type for posproxy operations
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The request is not well-formed XML or has no Envelope/Body
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The SOAP Body has no child elements
    #[error("Body element empty")]
    EmptyBody,

    /// Element name with no ePOS-Print mapping
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),

    /// Attribute or encoder argument outside its documented range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Embedded bitmap could not be decoded or has the wrong dimensions
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Bitmap exceeds what the printer can rasterize
    #[error("image too large: {0}")]
    ImageTooLarge(String),

    /// The device write did not finish within the configured timeout
    #[error("device write timed out after {0:?}")]
    DeviceWriteTimeout(Duration),

    /// Transport-level errors (connection, I/O)
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Processing stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Extraction,
    Element,
    Transport,
}

impl ProxyError {
    /// Classify the error by the stage that produced it.
    pub fn stage(&self) -> ErrorStage {
        match self {
            ProxyError::MalformedDocument(_) | ProxyError::EmptyBody => ErrorStage::Extraction,
            ProxyError::UnsupportedElement(_)
            | ProxyError::InvalidParameter(_)
            | ProxyError::ImageDecode(_)
            | ProxyError::ImageTooLarge(_) => ErrorStage::Element,
            ProxyError::DeviceWriteTimeout(_) | ProxyError::Transport(_) | ProxyError::Io(_) => {
                ErrorStage::Transport
            }
        }
    }

    /// Whether the failing element can be skipped while the job carries on.
    pub fn is_recoverable(&self) -> bool {
        self.stage() == ErrorStage::Element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert_eq!(ProxyError::EmptyBody.stage(), ErrorStage::Extraction);
        assert_eq!(
            ProxyError::MalformedDocument("eof".into()).stage(),
            ErrorStage::Extraction
        );
        assert_eq!(
            ProxyError::UnsupportedElement("barcode".into()).stage(),
            ErrorStage::Element
        );
        assert_eq!(
            ProxyError::DeviceWriteTimeout(Duration::from_secs(1)).stage(),
            ErrorStage::Transport
        );
    }

    #[test]
    fn test_only_element_errors_are_recoverable() {
        assert!(ProxyError::ImageTooLarge("600 > 576".into()).is_recoverable());
        assert!(ProxyError::InvalidParameter("width".into()).is_recoverable());
        assert!(!ProxyError::EmptyBody.is_recoverable());
        assert!(!ProxyError::Transport("closed".into()).is_recoverable());
    }

    #[test]
    fn test_empty_body_message() {
        assert_eq!(ProxyError::EmptyBody.to_string(), "Body element empty");
    }
}
