//! ttyport
//!
//! Open a POSIX serial TTY, configure its line discipline and baud rate,
//! read raw bytes from it, and put the original configuration back when done.
//!
//! # Modules
//!
//! - `port`: the `SerialPort` wrapper and its value types
//! - `error`: the serial error taxonomy
//! - `config`: TOML configuration with environment overrides
//! - `logging`: `tracing` subscriber setup

#[cfg(not(unix))]
compile_error!("ttyport drives POSIX terminals and only builds on unix targets");

pub mod config;
pub mod error;
pub mod logging;
pub mod port;

pub use error::{SerialError, SerialResult};
pub use port::{
    BaudRate, InputMode, LineConfig, LineSnapshot, PortOptions, SerialPort, READ_BUFFER_CAPACITY,
};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
