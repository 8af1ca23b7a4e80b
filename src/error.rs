//! Error types for serial TTY operations.
//!
//! Construction failures (`DeviceNotFound`, `DeviceOpenFailed`,
//! `ConfigReadFailed`) are returned from [`SerialPort::open`] and never
//! terminate the process. Everything else is a recoverable per-call failure.
//!
//! [`SerialPort::open`]: crate::port::SerialPort::open

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the port layer.
pub type SerialResult<T> = Result<T, SerialError>;

/// Errors that can occur while operating a serial TTY.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The device node does not exist on the filesystem.
    #[error("Device not found: {}", .0.display())]
    DeviceNotFound(PathBuf),

    /// The device node exists but could not be opened for read/write.
    #[error("Failed to open device '{}': {source}", path.display())]
    DeviceOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The kernel line configuration could not be read (usually: not a TTY).
    #[error("Failed to read line configuration of '{}': {source}", path.display())]
    ConfigReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested rate is not one of the supported baud rates.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// The OS refused to encode a nominally supported rate.
    #[error("Failed to set baud rate {baud}: {source}")]
    BaudEncodingFailed {
        baud: u32,
        #[source]
        source: std::io::Error,
    },

    /// The operation needs an open port, but it was already closed.
    #[error("Port is not open")]
    PortNotOpen,

    /// Pushing the line configuration to the device failed.
    #[error("Could not apply configuration: {0}")]
    ApplyFailed(#[source] std::io::Error),

    /// The read system call failed.
    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Restoring the open-time configuration on close failed.
    #[error("Could not restore original configuration: {0}")]
    RestoreFailed(#[source] std::io::Error),
}

impl SerialError {
    /// Create a `DeviceNotFound` error from a device path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound(path.into())
    }

    /// True for the failures that can only happen while constructing a port.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::DeviceOpenFailed { .. } | Self::ConfigReadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = SerialError::not_found("/dev/ttyUSB9");
        assert_eq!(err.to_string(), "Device not found: /dev/ttyUSB9");

        let err = SerialError::UnsupportedBaudRate(1200);
        assert_eq!(err.to_string(), "Unsupported baud rate: 1200");

        let err = SerialError::PortNotOpen;
        assert_eq!(err.to_string(), "Port is not open");
    }

    #[test]
    fn test_open_failure_keeps_source() {
        let err = SerialError::DeviceOpenFailed {
            path: PathBuf::from("/dev/ttyS0"),
            source: std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/dev/ttyS0"));
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("denied"));
    }

    #[test]
    fn test_construction_error_classification() {
        assert!(SerialError::not_found("/dev/null0").is_construction_error());
        assert!(!SerialError::PortNotOpen.is_construction_error());
        assert!(!SerialError::ReadFailed(std::io::Error::from(ErrorKind::Interrupted))
            .is_construction_error());
    }
}
