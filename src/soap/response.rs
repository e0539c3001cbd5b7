//! # SOAP Replies
//!
//! Success and fault bodies returned to ePOS-Print clients.
//!
//! ## Success
//!
//! ```text
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <response success="true" code="" status="0" xmlns="http://www.epson-pos.com/schemas/2011/03/epos-print"/>
//!   </s:Body>
//! </s:Envelope>
//! ```
//!
//! ## Fault
//!
//! ```text
//! <s:Fault>
//!   <faultcode>s:Client</faultcode>
//!   <faultstring>cannot parse XML: Body element empty</faultstring>
//! </s:Fault>
//! ```

use quick_xml::escape::escape;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// ePOS-Print response namespace.
pub const EPOS_PRINT_NS: &str = "http://www.epson-pos.com/schemas/2011/03/epos-print";

/// Content type of every reply.
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Who is to blame for a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    /// The request could not be understood.
    Client,
    /// The request was fine but the printer could not be driven.
    Server,
}

impl FaultCode {
    fn as_str(self) -> &'static str {
        match self {
            FaultCode::Client => "s:Client",
            FaultCode::Server => "s:Server",
        }
    }
}

/// Envelope for a job that reached the printer.
///
/// ```
/// let body = posproxy::soap::response::success();
/// assert!(body.contains(r#"success="true""#));
/// ```
pub fn success() -> String {
    wrap(&format!(
        r#"<response success="true" code="" status="0" xmlns="{EPOS_PRINT_NS}"/>"#
    ))
}

/// Envelope carrying a SOAP fault with an escaped reason.
pub fn fault(code: FaultCode, reason: &str) -> String {
    wrap(&format!(
        "<s:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring></s:Fault>",
        code.as_str(),
        escape(reason)
    ))
}

fn wrap(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="{SOAP_ENVELOPE_NS}"><s:Body>{body}</s:Body></s:Envelope>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soap::envelope::parse_document;

    #[test]
    fn test_success_shape() {
        let body = success();
        assert!(body.contains("<s:Envelope"));
        assert!(body.contains(r#"success="true""#));

        let root = parse_document(body.as_bytes()).unwrap();
        let response = root.child("Body").and_then(|b| b.child("response")).unwrap();
        assert_eq!(response.attr("code"), Some(""));
        assert_eq!(response.attr("status"), Some("0"));
    }

    #[test]
    fn test_fault_escapes_reason() {
        let body = fault(FaultCode::Client, "cannot parse XML: <text> & more");
        let root = parse_document(body.as_bytes()).unwrap();
        let fault = root.child("Body").and_then(|b| b.child("Fault")).unwrap();
        assert_eq!(fault.child("faultcode").unwrap().content, "s:Client");
        assert_eq!(
            fault.child("faultstring").unwrap().content,
            "cannot parse XML: <text> & more"
        );
    }

    #[test]
    fn test_server_fault_code() {
        assert!(fault(FaultCode::Server, "x").contains("<faultcode>s:Server</faultcode>"));
    }
}
