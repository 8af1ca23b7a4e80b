//! Construction options for [`SerialPort`](super::SerialPort).

use super::baud::BaudRate;
use super::line_config::InputMode;
use std::path::PathBuf;

/// Device used when no path is given: the usual first USB-serial adapter.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// What to open and how to configure it.
///
/// `baud` is the raw requested rate. An unsupported value does not make
/// opening fail; the port falls back to [`BaudRate::default`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOptions {
    pub device: PathBuf,
    pub baud: u32,
    pub input_mode: InputMode,
}

impl Default for PortOptions {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            baud: BaudRate::default().as_u32(),
            input_mode: InputMode::Canonical,
        }
    }
}

impl PortOptions {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    pub fn input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }

    pub fn canonical(self, canonical: bool) -> Self {
        self.input_mode(InputMode::from_canonical(canonical))
    }

    /// The rate the port will actually start with, and whether the requested
    /// one had to be replaced.
    pub fn effective_baud(&self) -> (BaudRate, bool) {
        match BaudRate::try_from(self.baud) {
            Ok(rate) => (rate, false),
            Err(_) => (BaudRate::default(), true),
        }
    }
}
