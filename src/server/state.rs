//! Server state and configuration.

use std::time::Duration;

use crate::error::ProxyError;
use crate::job::{Device, JobOptions, PrintService};
use crate::transport::DeviceTarget;

/// Default device write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8000")
    pub listen_addr: String,
    /// Printer to drive
    pub device: DeviceTarget,
    /// Upper bound for one job's device write
    pub write_timeout: Duration,
    /// Paper width, dithering and cut feed
    pub job: JobOptions,
}

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    pub service: PrintService,
}

impl AppState {
    pub fn new(service: PrintService) -> Self {
        Self { service }
    }

    /// Open the configured device and build the service around it.
    pub fn open(config: &ServerConfig) -> Result<Self, ProxyError> {
        let transport = config.device.open(config.write_timeout)?;
        let device = Device::new(transport, config.write_timeout);
        Ok(Self::new(PrintService::new(device, config.job)))
    }
}
