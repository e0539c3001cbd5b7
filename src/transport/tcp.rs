//! TCP transport for network receipt printers (port 9100 / RAW).
//!
//! Connect and write are both bounded by the configured timeout. A write
//! that times out surfaces as [`ProxyError::DeviceWriteTimeout`]; the
//! stream is then considered dead until [`Transport::reconnect`].

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::Transport;
use crate::error::ProxyError;

/// Standard raw printing port.
pub const DEFAULT_PORT: u16 = 9100;

/// A synchronous TCP connection to a receipt printer.
pub struct NetworkPrinter {
    addr: SocketAddr,
    stream: TcpStream,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Resolve `addr` (`host:port`) and connect.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| ProxyError::Transport(format!("cannot resolve {addr}: {e}")))?
            .next()
            .ok_or_else(|| ProxyError::Transport(format!("{addr} resolved to no address")))?;

        let stream = open_stream(&socket_addr, timeout)?;
        Ok(Self {
            addr: socket_addr,
            stream,
            timeout,
        })
    }
}

impl Transport for NetworkPrinter {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProxyError> {
        self.stream
            .write_all(data)
            .and_then(|()| self.stream.flush())
            .map_err(|e| write_error(e, self.timeout))
    }

    fn reconnect(&mut self) -> Result<(), ProxyError> {
        debug!(addr = %self.addr, "reconnecting");
        let _ = self.stream.shutdown(Shutdown::Both);
        self.stream = open_stream(&self.addr, self.timeout)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

impl Drop for NetworkPrinter {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn open_stream(addr: &SocketAddr, timeout: Duration) -> Result<TcpStream, ProxyError> {
    let stream = TcpStream::connect_timeout(addr, timeout)
        .map_err(|e| ProxyError::Transport(format!("cannot connect to {addr}: {e}")))?;

    stream
        .set_nodelay(true)
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| ProxyError::Transport(format!("cannot configure {addr}: {e}")))?;

    Ok(stream)
}

fn write_error(e: io::Error, timeout: Duration) -> ProxyError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            ProxyError::DeviceWriteTimeout(timeout)
        }
        _ => ProxyError::Transport(format!("Write failed: {e}")),
    }
}
