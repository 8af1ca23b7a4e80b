//! Termios-backed serial TTY.
//!
//! [`SerialPort`] owns one open device node for its whole life. The line
//! configuration found at open time is saved and written back when the port
//! is closed or dropped, so the device is left the way it was found.

use super::baud::BaudRate;
use super::line_config::{InputMode, LineConfig};
use super::options::PortOptions;
use crate::error::{SerialError, SerialResult};
use rustix::termios::{tcflush, tcgetattr, tcsetattr, OptionalActions, QueueSelector};
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Largest number of bytes a single read can return. Longer requests are
/// truncated to this size. An NMEA sentence is at most 82 bytes.
pub const READ_BUFFER_CAPACITY: usize = 255;

/// An open, configured serial TTY.
pub struct SerialPort {
    /// `None` once the port has been closed.
    device: Option<File>,
    path: PathBuf,
    baud: BaudRate,
    input_mode: InputMode,
    current: LineConfig,
    saved: LineConfig,
    last_read: Vec<u8>,
}

impl SerialPort {
    /// Open and configure a serial device.
    ///
    /// The path must exist. A requested baud rate outside the supported set
    /// is not an error here: the port starts at the default rate and a
    /// warning is logged. The device is opened with `O_NOCTTY`, pending input
    /// is flushed and the new configuration is applied before returning.
    ///
    /// # Example
    /// ```no_run
    /// use ttyport::port::{PortOptions, SerialPort};
    ///
    /// let mut gps = SerialPort::open(PortOptions::new("/dev/ttyUSB0").baud(4800))?;
    /// let n = gps.read()?;
    /// println!("{n} bytes: {}", gps.data()?);
    /// # Ok::<(), ttyport::SerialError>(())
    /// ```
    pub fn open(options: PortOptions) -> SerialResult<Self> {
        let (baud, fell_back) = options.effective_baud();
        if fell_back {
            warn!(
                "Invalid baud rate {} requested for {}, using {}",
                options.baud,
                options.device.display(),
                baud
            );
        }

        let PortOptions {
            device: path,
            input_mode,
            ..
        } = options;

        if std::fs::metadata(&path).is_err() {
            return Err(SerialError::not_found(path));
        }

        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| SerialError::DeviceOpenFailed {
                path: path.clone(),
                source,
            })?;

        let saved = tcgetattr(&device)
            .map(LineConfig::from_termios)
            .map_err(|errno| SerialError::ConfigReadFailed {
                path: path.clone(),
                source: errno.into(),
            })?;
        let current = LineConfig::derive(&saved, baud, input_mode)?;

        let mut port = Self {
            device: Some(device),
            path,
            baud,
            input_mode,
            current,
            saved,
            last_read: Vec::new(),
        };

        // Past this point dropping `port` restores the saved configuration.
        port.flush(QueueSelector::IFlush);
        port.apply_config()?;

        info!(
            "Opened {} at {} baud ({:?} input)",
            port.path.display(),
            port.baud,
            port.input_mode
        );
        Ok(port)
    }

    /// Open `/dev/ttyUSB0` at 4800 baud in canonical mode.
    pub fn open_default() -> SerialResult<Self> {
        Self::open(PortOptions::default())
    }

    fn handle(&self) -> SerialResult<&File> {
        self.device.as_ref().ok_or(SerialError::PortNotOpen)
    }

    fn flush(&self, queue: QueueSelector) {
        if let Some(device) = &self.device {
            if let Err(errno) = tcflush(device, queue) {
                warn!("Could not flush {}: {}", self.path.display(), errno);
            }
        }
    }

    /// Change the speed of the cached configuration.
    ///
    /// Nothing changes on the device until [`apply_config`](Self::apply_config)
    /// is called. Unsupported rates are rejected and leave the port untouched.
    pub fn set_baud(&mut self, rate: u32) -> SerialResult<()> {
        self.handle()?;
        let baud = match BaudRate::try_from(rate) {
            Ok(baud) => baud,
            Err(err) => {
                warn!("Invalid baud rate requested: {}", rate);
                return Err(err);
            }
        };
        self.current.set_baud(baud)?;
        self.baud = baud;
        debug!("Staged {} baud for {}", baud, self.path.display());
        Ok(())
    }

    /// Push the cached configuration to the device, effective immediately.
    pub fn apply_config(&mut self) -> SerialResult<()> {
        let device = self.handle()?;
        tcsetattr(device, OptionalActions::Now, self.current.termios())
            .map_err(|errno| SerialError::ApplyFailed(errno.into()))?;
        debug!("Applied {:?} to {}", self.current, self.path.display());
        Ok(())
    }

    /// Input speed as the kernel currently reports it.
    ///
    /// This reads the device, so a [`set_baud`](Self::set_baud) that has not
    /// been applied yet is not visible here.
    pub fn device_baud(&self) -> SerialResult<u32> {
        Ok(self.device_config()?.input_speed())
    }

    /// The full line configuration as the kernel currently reports it.
    pub fn device_config(&self) -> SerialResult<LineConfig> {
        let device = self.handle()?;
        tcgetattr(device)
            .map(LineConfig::from_termios)
            .map_err(|errno| SerialError::ConfigReadFailed {
                path: self.path.clone(),
                source: errno.into(),
            })
    }

    /// Copy of the cached configuration. Not re-read from the device; use
    /// [`device_config`](Self::device_config) for that.
    pub fn cached_config(&self) -> LineConfig {
        self.current.clone()
    }

    /// The rate last accepted by `open` or `set_baud`, applied or not.
    pub fn configured_baud(&self) -> BaudRate {
        self.baud
    }

    /// Configuration found on the device at open time.
    pub fn saved_config(&self) -> &LineConfig {
        &self.saved
    }

    pub fn device_path(&self) -> &Path {
        &self.path
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Read up to [`READ_BUFFER_CAPACITY`] bytes.
    ///
    /// See [`read_up_to`](Self::read_up_to).
    pub fn read(&mut self) -> SerialResult<usize> {
        self.read_up_to(READ_BUFFER_CAPACITY)
    }

    /// Read up to `max_bytes` bytes, blocking per the input mode.
    ///
    /// Queued input and output are discarded first, so only data arriving
    /// after the call is returned. On success the bytes replace the last-read
    /// buffer and their count is returned. `max_bytes` is capped at
    /// [`READ_BUFFER_CAPACITY`].
    pub fn read_up_to(&mut self, max_bytes: usize) -> SerialResult<usize> {
        self.handle()?;
        self.flush(QueueSelector::IOFlush);

        let len = max_bytes.min(READ_BUFFER_CAPACITY);
        let mut buf = [0u8; READ_BUFFER_CAPACITY];
        let mut device = self.handle()?;
        let n = device
            .read(&mut buf[..len])
            .map_err(SerialError::ReadFailed)?;

        self.last_read.clear();
        self.last_read.extend_from_slice(&buf[..n]);
        debug!("Read {} of {} bytes from {}", n, len, self.path.display());
        Ok(n)
    }

    /// The last read as text, cut at the first NUL byte.
    pub fn data(&self) -> SerialResult<String> {
        let bytes = self.data_bytes()?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// The last read exactly as received, NUL bytes included.
    pub fn data_bytes(&self) -> SerialResult<&[u8]> {
        self.handle()?;
        Ok(&self.last_read)
    }

    /// Restore the saved configuration and release the device.
    ///
    /// The handle is released even when restoring fails. Closing twice
    /// returns [`SerialError::PortNotOpen`].
    pub fn close(&mut self) -> SerialResult<()> {
        let device = self.device.take().ok_or(SerialError::PortNotOpen)?;
        let restored = tcsetattr(&device, OptionalActions::Now, self.saved.termios())
            .map_err(|errno| SerialError::RestoreFailed(errno.into()));
        drop(device);
        debug!("Closed {}", self.path.display());
        restored
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        if self.device.is_some() {
            if let Err(err) = self.close() {
                warn!("{} while closing {}", err, self.path.display());
            }
        }
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("baud", &self.baud)
            .field("input_mode", &self.input_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_device_is_not_found() {
        let opts = PortOptions::new("/dev/nonexistent_tty_12345");
        match SerialPort::open(opts) {
            Err(SerialError::DeviceNotFound(path)) => {
                assert!(path.to_string_lossy().contains("nonexistent"));
            }
            other => panic!("Expected DeviceNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        match SerialPort::open(PortOptions::new(dir.path())) {
            Err(SerialError::DeviceOpenFailed { path, .. }) => assert_eq!(path, dir.path()),
            other => panic!("Expected DeviceOpenFailed, got: {:?}", other),
        }
    }

    #[test]
    fn test_regular_file_is_not_a_terminal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        match SerialPort::open(PortOptions::new(file.path())) {
            Err(SerialError::ConfigReadFailed { .. }) => {}
            other => panic!("Expected ConfigReadFailed, got: {:?}", other),
        }
    }
}
