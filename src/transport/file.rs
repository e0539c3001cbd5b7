//! # Device File Transport
//!
//! Writes jobs to a character device or a regular file.
//!
//! ## Typical Devices (Linux)
//!
//! | Connection | Path |
//! |------------|------|
//! | USB printer class | `/dev/usb/lp0` |
//! | USB serial adapter | `/dev/ttyUSB0` |
//! | Bluetooth SPP | `/dev/rfcomm0` |
//! | Capture for debugging | any regular file |
//!
//! ## TTY Configuration
//!
//! Serial devices are switched to raw mode so binary data is transmitted
//! without modification:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//!
//! Non-TTY targets are left alone.
//!
//! ## Chunked Writes
//!
//! Large jobs (raster images) are written in 4096-byte chunks with a short
//! pause in between so slow serial links are not overrun.
//!
//! ## Write Timeout
//!
//! The device is opened with `O_NONBLOCK`. When it stops accepting data
//! (printer off, cable pulled, paper out on `/dev/usb/lp0`) the write
//! waits in `poll(2)` and gives up with
//! [`ProxyError::DeviceWriteTimeout`] once the job's deadline passes, so a
//! dead device never pins the writer thread. Bytes already accepted by the
//! kernel stay queued there.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::Transport;
use crate::error::ProxyError;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Time allowed for one whole job unless [`DeviceFile::set_write_timeout`] says otherwise
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// # Device File Transport
///
/// ## Example
///
/// ```no_run
/// use posproxy::transport::{DeviceFile, Transport};
/// use posproxy::protocol::commands;
///
/// let mut printer = DeviceFile::open("/dev/usb/lp0")?;
/// printer.write_all(&commands::init())?;
/// # Ok::<(), posproxy::error::ProxyError>(())
/// ```
pub struct DeviceFile {
    path: PathBuf,
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
    write_timeout: Duration,
}

impl DeviceFile {
    /// Open a device for writing.
    ///
    /// Regular files are created if missing and appended to.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the `lp` or `dialout` group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, ProxyError> {
        let path = device.as_ref().to_path_buf();
        let file = open_file(&path)?;

        Ok(Self {
            path,
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        })
    }

    /// Set the chunk size for large writes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }

    /// Set the time one [`Transport::write_all`] call may take.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    fn write_before(&mut self, mut data: &[u8], deadline: Instant) -> Result<(), ProxyError> {
        while !data.is_empty() {
            match self.file.write(data) {
                Ok(0) => {
                    return Err(ProxyError::Transport(
                        "Write failed: device accepted no data".into(),
                    ));
                }
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => self.wait_writable(deadline)?,
                Err(e) => return Err(ProxyError::Transport(format!("Write failed: {}", e))),
            }
        }
        Ok(())
    }

    /// Block until the device takes more data or the deadline passes.
    ///
    /// Error conditions reported by `poll` (POLLERR, POLLHUP) count as
    /// ready; the following write returns the actual error.
    fn wait_writable(&self, deadline: Instant) -> Result<(), ProxyError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ProxyError::DeviceWriteTimeout(self.write_timeout));
        }

        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        };
        // round up so a sub-millisecond remainder still waits
        let millis = remaining.as_micros().div_ceil(1000).min(i32::MAX as u128) as i32;
        // SAFETY: pfd is a single valid pollfd and the descriptor is owned by self.file
        let ready = unsafe { libc::poll(&mut pfd, 1, millis) };
        match ready {
            0 => Err(ProxyError::DeviceWriteTimeout(self.write_timeout)),
            n if n < 0 => {
                let e = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::Interrupted {
                    Ok(())
                } else {
                    Err(ProxyError::Transport(format!("poll failed: {}", e)))
                }
            }
            _ => Ok(()),
        }
    }
}

impl Transport for DeviceFile {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProxyError> {
        let deadline = Instant::now() + self.write_timeout;
        if data.len() <= self.chunk_size {
            self.write_before(data, deadline)?;
        } else {
            for chunk in data.chunks(self.chunk_size) {
                self.write_before(chunk, deadline)?;

                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }

        self.file
            .flush()
            .map_err(|e| ProxyError::Transport(format!("Flush failed: {}", e)))
    }

    fn reconnect(&mut self) -> Result<(), ProxyError> {
        debug!(path = %self.path.display(), "reopening device");
        self.file = open_file(&self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn open_file(path: &Path) -> Result<File, ProxyError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map_err(|e| ProxyError::Transport(format!("Failed to open {}: {}", path.display(), e)))?;

    let fd = file.as_raw_fd();
    // SAFETY: fd is a valid open descriptor owned by `file`
    if unsafe { libc::isatty(fd) } == 1 {
        configure_tty_raw(fd)?;
    }
    Ok(file)
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY are cleared as well: 0x11 and 0x13 show up in raster
/// data and must not be taken as flow control.
fn configure_tty_raw(fd: i32) -> Result<(), ProxyError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(ProxyError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(ProxyError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
