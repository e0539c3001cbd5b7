//! # posproxy - ePOS-Print to ESC/POS Bridge
//!
//! posproxy accepts print jobs in Epson's ePOS-Print SOAP vocabulary and
//! drives any ESC/POS receipt printer with them. It provides:
//!
//! - **SOAP extraction**: Body children as generic elements
//! - **Protocol implementation**: ESC/POS command builders
//! - **State machine**: minimal style transitions per element
//! - **Rasterizing**: bitmap decode, dithering and bit packing
//! - **Jobs**: atomic, serialized device writes with SOAP replies
//! - **Transport**: device files and raw TCP
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use posproxy::job::{Device, JobOptions, PrintService};
//! use posproxy::transport::DeviceFile;
//!
//! # async fn example() -> Result<(), posproxy::ProxyError> {
//! let device = Device::new(Box::new(DeviceFile::open("/dev/usb/lp0")?), Duration::from_secs(10));
//! let service = PrintService::new(device, JobOptions::default());
//!
//! let request = br#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <text align="center" em="true">RECEIPT&#10;</text>
//!     <feed line="2"/>
//!     <cut type="feed"/>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let reply = service.process(request.to_vec()).await;
//! assert_eq!(reply.status(), 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`soap`] | Envelope extraction and SOAP replies |
//! | [`ir`] | Typed ops and the printer state machine |
//! | [`protocol`] | ESC/POS command builders |
//! | [`render`] | Dithering and raster images |
//! | [`job`] | Job compilation, device locking, request adapter |
//! | [`transport`] | Device files and network printers |
//! | [`printer`] | Printer configurations |
//! | [`server`] | HTTP endpoint |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Anything speaking Epson ESC/POS: TM-T88, TM-T20, TM-m30 and the many
//! 58mm/80mm clones. Barcodes and page mode are not translated.

pub mod error;
pub mod ir;
pub mod job;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod server;
pub mod soap;
pub mod transport;

// Re-exports for convenience
pub use error::ProxyError;
pub use job::{Device, JobOptions, PrintService};
pub use printer::PrinterConfig;
