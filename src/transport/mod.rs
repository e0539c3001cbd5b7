//! # Printer Transport Layer
//!
//! Byte sinks the proxy writes finished jobs to.
//!
//! ## Available Transports
//!
//! - [`file`]: character devices (`/dev/usb/lp0`, `/dev/ttyUSB0`,
//!   `/dev/rfcomm0`) or plain capture files
//! - [`tcp`]: raw TCP to network printers (port 9100)
//!
//! ## Contract
//!
//! [`Transport::write_all`] either delivers every byte in order or fails.
//! Callers never see partial success; after a failure the connection is
//! treated as suspect and [`Transport::reconnect`] runs before the next job.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ProxyError;

pub mod file;
pub mod tcp;

pub use file::DeviceFile;
pub use tcp::NetworkPrinter;

/// Ordered, all-or-error byte sink.
pub trait Transport: Send {
    /// Write the whole buffer and flush.
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProxyError>;

    /// Re-establish the underlying connection.
    fn reconnect(&mut self) -> Result<(), ProxyError> {
        Ok(())
    }

    /// Human-readable name for logs.
    fn describe(&self) -> String;
}

/// Where to send jobs, as given on the command line.
///
/// ```
/// use posproxy::transport::DeviceTarget;
///
/// let net: DeviceTarget = "tcp://192.168.1.50".parse().unwrap();
/// assert_eq!(net, DeviceTarget::Network("192.168.1.50:9100".into()));
///
/// let dev: DeviceTarget = "/dev/usb/lp0".parse().unwrap();
/// assert_eq!(dev, DeviceTarget::File("/dev/usb/lp0".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    File(PathBuf),
    Network(String),
}

impl DeviceTarget {
    /// Open the target. `timeout` bounds TCP connects and every job write.
    pub fn open(&self, timeout: Duration) -> Result<Box<dyn Transport>, ProxyError> {
        match self {
            DeviceTarget::File(path) => {
                let mut file = DeviceFile::open(path)?;
                file.set_write_timeout(timeout);
                Ok(Box::new(file))
            }
            DeviceTarget::Network(addr) => Ok(Box::new(NetworkPrinter::connect(addr, timeout)?)),
        }
    }
}

impl FromStr for DeviceTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err("tcp:// target needs a host".to_string());
            }
            let addr = if addr.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok())
            {
                addr.to_string()
            } else {
                format!("{addr}:{}", tcp::DEFAULT_PORT)
            };
            return Ok(DeviceTarget::Network(addr));
        }
        if s.is_empty() {
            return Err("device path is empty".to_string());
        }
        Ok(DeviceTarget::File(PathBuf::from(s)))
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceTarget::File(path) => write!(f, "{}", path.display()),
            DeviceTarget::Network(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp_with_port() {
        assert_eq!(
            "tcp://printer.local:9101".parse::<DeviceTarget>(),
            Ok(DeviceTarget::Network("printer.local:9101".into()))
        );
    }

    #[test]
    fn test_parse_tcp_default_port() {
        assert_eq!(
            "tcp://10.0.0.7".parse::<DeviceTarget>(),
            Ok(DeviceTarget::Network("10.0.0.7:9100".into()))
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!("tcp://".parse::<DeviceTarget>().is_err());
        assert!("".parse::<DeviceTarget>().is_err());
    }

    #[test]
    fn test_display() {
        let target: DeviceTarget = "tcp://10.0.0.7".parse().unwrap();
        assert_eq!(target.to_string(), "tcp://10.0.0.7:9100");
        assert_eq!(
            DeviceTarget::File("/dev/usb/lp0".into()).to_string(),
            "/dev/usb/lp0"
        );
    }
}
