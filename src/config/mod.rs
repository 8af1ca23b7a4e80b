//! Configuration module for ttyport.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `TTYPORT_CONFIG` environment variable (explicit path)
//! 2. `./ttyport.toml` (current directory)
//! 3. `$XDG_CONFIG_HOME/ttyport/config.toml` (falls back to `~/.config`)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `TTYPORT_<SECTION>_<KEY>`
//!
//! - `TTYPORT_SERIAL_DEVICE=/dev/ttyACM0`
//! - `TTYPORT_SERIAL_BAUD=9600`
//! - `TTYPORT_SERIAL_CANONICAL=false`
//! - `TTYPORT_SERIAL_READ_SIZE=82`
//! - `TTYPORT_LOGGING_LEVEL=debug`
//! - `TTYPORT_LOGGING_FORMAT=json`
//!
//! # Example
//!
//! ```rust,no_run
//! use ttyport::config::ConfigLoader;
//! use ttyport::port::SerialPort;
//!
//! let config = ConfigLoader::load()?.into_config();
//! let port = SerialPort::open(config.serial.port_options())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, LOG_LEVELS};
