//! # Intermediate Representation (IR)
//!
//! Sits between the generic SOAP elements and raw ESC/POS bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌───────────────┐
//! │  Element    │ ──► │     Op      │ ──► │    Codegen    │ ──► bytes
//! │ (untyped)   │     │ (validated) │     │ (state machine)│
//! └─────────────┘     └─────────────┘     └───────────────┘
//!     convert             ops                  apply
//! ```
//!
//! ## Example
//!
//! ```
//! use posproxy::ir::{apply, EmitOptions, Op, PrinterState};
//! use posproxy::soap::Element;
//!
//! let element = Element::new("text").with_attr("align", "center").with_content("HELLO\n");
//! let op = Op::from_element(&element).unwrap();
//!
//! let (state, bytes) = apply(&PrinterState::default(), &op, &EmitOptions::default()).unwrap();
//! assert_eq!(&bytes[..3], &[0x1B, 0x61, 0x01]);
//! assert!(bytes.ends_with(b"HELLO\n"));
//! # let _ = state;
//! ```

mod codegen;
mod convert;
mod ops;

pub use codegen::{EmitOptions, apply, transition};
pub use ops::*;
