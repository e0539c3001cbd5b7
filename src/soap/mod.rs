//! # SOAP Layer
//!
//! - [`envelope`]: parse a request and extract the `Body` children
//! - [`response`]: build success and fault envelopes

pub mod envelope;
pub mod response;

pub use envelope::{Element, extract_body};
pub use response::FaultCode;
