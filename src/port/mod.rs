//! Serial TTY access.
//!
//! [`SerialPort`] is the only stateful type: it owns the device handle, the
//! cached line configuration and the configuration to restore on close.
//! [`BaudRate`], [`LineConfig`] and [`PortOptions`] are plain values around it.

pub mod baud;
pub mod line_config;
pub mod options;
pub mod tty;

pub use baud::BaudRate;
pub use line_config::{InputMode, LineConfig, LineSnapshot};
pub use options::{PortOptions, DEFAULT_DEVICE};
pub use tty::{SerialPort, READ_BUFFER_CAPACITY};
