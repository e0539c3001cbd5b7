//! # Print Jobs
//!
//! Turns one SOAP request into one atomic device transaction.
//!
//! ## Flow
//!
//! ```text
//! request bytes
//!     │ extract_body            (fault 400, nothing written)
//!     ▼
//! Vec<Element>
//!     │ Job::compile            (bad elements skipped and recorded)
//!     ▼
//! ESC @ ... 0xFA
//!     │ Device::submit          (exclusive, bounded by timeout)
//!     ▼
//! SoapReply                     (200 success / 500 fault)
//! ```
//!
//! ## Device Access
//!
//! [`Device`] serializes jobs: the lock is taken before the first byte goes
//! out and released after the last one. A caller that goes away while
//! waiting for the lock writes nothing; once the write has started it runs
//! to completion on a blocking thread and its outcome is only logged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::ProxyError;
use crate::ir::{EmitOptions, Op, PrinterState, apply};
use crate::printer::PrinterConfig;
use crate::protocol::commands;
use crate::render::{DitheringAlgorithm, RasterOptions};
use crate::soap::response::{self, FaultCode};
use crate::soap::{Element, extract_body};
use crate::transport::Transport;

/// How long a job may wait for a busy device, as a multiple of the write
/// timeout.
const QUEUE_TIMEOUT_FACTOR: u32 = 4;

// ============================================================================
// OPTIONS
// ============================================================================

/// Per-deployment settings that shape the generated bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobOptions {
    pub printer: PrinterConfig,
    pub dithering: DitheringAlgorithm,
    /// Lines fed past the cutter for `cut type="feed"`.
    pub feed_before_cut: u8,
}

impl JobOptions {
    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            raster: RasterOptions::for_printer(&self.printer, self.dithering),
            cut_feed_lines: self.feed_before_cut,
        }
    }
}

// ============================================================================
// COMPILATION
// ============================================================================

/// An element that was left out of the job.
#[derive(Debug)]
pub struct SkippedElement {
    /// Position among the Body children.
    pub index: usize,
    pub name: String,
    pub error: ProxyError,
}

/// A compiled job, ready to be written.
#[derive(Debug)]
pub struct Job {
    /// Complete byte stream, `ESC @` first and `0xFA` last.
    pub bytes: Vec<u8>,
    /// Printer state after the last element.
    pub final_state: PrinterState,
    /// Number of Body children seen.
    pub elements: usize,
    pub skipped: Vec<SkippedElement>,
}

impl Job {
    /// Parse a SOAP request and compile its Body.
    ///
    /// Only extraction errors are returned; element errors end up in
    /// [`Job::skipped`].
    pub fn from_request(body: &[u8], options: &JobOptions) -> Result<Job, ProxyError> {
        let elements = extract_body(body)?;
        Ok(Job::compile(&elements, options))
    }

    /// Fold the state machine over `elements`.
    ///
    /// ## Example
    ///
    /// ```
    /// use posproxy::job::{Job, JobOptions};
    /// use posproxy::soap::Element;
    ///
    /// let elements = vec![
    ///     Element::new("text").with_content("Hi\n"),
    ///     Element::new("barcode"),
    ///     Element::new("cut"),
    /// ];
    /// let job = Job::compile(&elements, &JobOptions::default());
    ///
    /// assert_eq!(job.bytes, b"\x1b@Hi\n\x1dV\x00\xfa".to_vec());
    /// assert_eq!(job.skipped[0].name, "barcode");
    /// ```
    pub fn compile(elements: &[Element], options: &JobOptions) -> Job {
        let emit = options.emit_options();
        let mut bytes = commands::init();
        let mut state = PrinterState::default();
        let mut skipped = Vec::new();

        for (index, element) in elements.iter().enumerate() {
            let result = Op::from_element(element).and_then(|op| apply(&state, &op, &emit));
            match result {
                Ok((next, out)) => {
                    state = next;
                    bytes.extend(out);
                }
                Err(error) => {
                    warn!(index, element = %element.name, %error, "skipping element");
                    skipped.push(SkippedElement {
                        index,
                        name: element.name.clone(),
                        error,
                    });
                }
            }
        }

        bytes.extend(commands::end_of_job());
        Job {
            bytes,
            final_state: state,
            elements: elements.len(),
            skipped,
        }
    }
}

/// What happened to a job that reached the device.
#[derive(Debug)]
pub struct JobReport {
    pub id: Uuid,
    pub elements: usize,
    pub skipped: Vec<SkippedElement>,
    pub bytes_written: usize,
}

// ============================================================================
// DEVICE
// ============================================================================

/// Shared handle to one physical printer.
///
/// Cloning is cheap; all clones share the same connection and lock.
#[derive(Clone)]
pub struct Device {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    stale: Arc<AtomicBool>,
    timeout: Duration,
    name: Arc<str>,
}

impl Device {
    pub fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        let name = transport.describe().into();
        Self {
            transport: Arc::new(Mutex::new(transport)),
            stale: Arc::new(AtomicBool::new(false)),
            timeout,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the next job will reconnect first.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Write one complete job with exclusive access to the device.
    ///
    /// ## Errors
    ///
    /// - [`ProxyError::DeviceWriteTimeout`] if the device stays busy or the
    ///   write does not finish in time; the connection is then marked stale
    /// - whatever the transport reports for reconnect or write failures
    pub async fn submit(&self, bytes: Vec<u8>) -> Result<(), ProxyError> {
        let queue_timeout = self.timeout * QUEUE_TIMEOUT_FACTOR;
        let mut transport = tokio::time::timeout(queue_timeout, self.transport.clone().lock_owned())
            .await
            .map_err(|_| {
                warn!(device = %self.name, "device busy, giving up");
                ProxyError::DeviceWriteTimeout(queue_timeout)
            })?;

        let stale = self.stale.clone();
        let span = tracing::Span::current();
        let write = tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                if stale.swap(false, Ordering::SeqCst) {
                    info!(device = %transport.describe(), "reconnecting stale device");
                    if let Err(e) = transport.reconnect() {
                        stale.store(true, Ordering::SeqCst);
                        error!(error = %e, "reconnect failed");
                        return Err(e);
                    }
                }

                let started = Instant::now();
                let result = transport.write_all(&bytes);
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match &result {
                    Ok(()) => info!(bytes = bytes.len(), elapsed_ms, "job written"),
                    Err(e) => {
                        stale.store(true, Ordering::SeqCst);
                        error!(bytes = bytes.len(), elapsed_ms, error = %e, "device write failed");
                    }
                }
                result
            })
        });

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => {
                self.stale.store(true, Ordering::SeqCst);
                Err(ProxyError::Transport(format!("writer task failed: {join}")))
            }
            Err(_) => {
                self.stale.store(true, Ordering::SeqCst);
                warn!(device = %self.name, timeout = ?self.timeout, "device write timed out");
                Err(ProxyError::DeviceWriteTimeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("stale", &self.is_stale())
            .finish()
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Written to the device (possibly with skipped elements).
    Printed,
    /// The request could not be parsed; nothing was written.
    Rejected,
    /// Encoding succeeded but the device write failed.
    Failed,
}

/// SOAP body plus the HTTP status it should travel with.
#[derive(Debug)]
pub struct SoapReply {
    pub outcome: Outcome,
    pub body: String,
    pub report: Option<JobReport>,
}

impl SoapReply {
    pub fn status(&self) -> u16 {
        match self.outcome {
            Outcome::Printed => 200,
            Outcome::Rejected => 400,
            Outcome::Failed => 500,
        }
    }
}

/// Request adapter: SOAP in, bytes to the device, SOAP out.
#[derive(Debug, Clone)]
pub struct PrintService {
    device: Device,
    options: JobOptions,
}

impl PrintService {
    pub fn new(device: Device, options: JobOptions) -> Self {
        Self { device, options }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Handle one request body.
    pub async fn process(&self, body: Vec<u8>) -> SoapReply {
        let id = Uuid::new_v4();
        let span = info_span!("job", %id, device = %self.device.name());
        self.run(id, body).instrument(span).await
    }

    async fn run(&self, id: Uuid, body: Vec<u8>) -> SoapReply {
        let options = self.options;
        let span = tracing::Span::current();
        let compiled =
            tokio::task::spawn_blocking(move || span.in_scope(|| Job::from_request(&body, &options)))
                .await;

        let job = match compiled {
            Ok(Ok(job)) => job,
            Ok(Err(e)) => {
                warn!(error = %e, "rejecting request");
                return SoapReply {
                    outcome: Outcome::Rejected,
                    body: response::fault(FaultCode::Client, &format!("cannot parse XML: {e}")),
                    report: None,
                };
            }
            Err(join) => {
                error!(error = %join, "compile task failed");
                return SoapReply {
                    outcome: Outcome::Failed,
                    body: response::fault(FaultCode::Server, "internal error"),
                    report: None,
                };
            }
        };

        let Job {
            bytes,
            elements,
            skipped,
            ..
        } = job;
        let report = JobReport {
            id,
            elements,
            skipped,
            bytes_written: bytes.len(),
        };
        info!(
            elements,
            skipped = report.skipped.len(),
            bytes = report.bytes_written,
            "job compiled"
        );

        match self.device.submit(bytes).await {
            Ok(()) => SoapReply {
                outcome: Outcome::Printed,
                body: response::success(),
                report: Some(report),
            },
            Err(e) => SoapReply {
                outcome: Outcome::Failed,
                body: response::fault(FaultCode::Server, &format!("printer write failed: {e}")),
                report: Some(report),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
