//! Line configuration record for a serial TTY.
//!
//! [`LineConfig`] wraps the kernel terminal attributes (`termios`) and knows
//! how to turn the attributes found on a freshly opened device into the
//! configuration this crate runs with: 8N1, local line, receiver on, hang up
//! on close, ignore parity errors, raw output, and either canonical or raw
//! input.

use super::baud::BaudRate;
use crate::error::{SerialError, SerialResult};
use rustix::termios::{
    ControlModes, InputModes, LocalModes, OutputModes, SpecialCodeIndex, Termios,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How input is delivered to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Line-buffered: a read returns once a line terminator arrives.
    #[default]
    Canonical,
    /// Non-canonical: a read returns as soon as one byte is available.
    Raw,
}

impl InputMode {
    /// Map the classic `canonical: bool` flag onto a mode.
    pub fn from_canonical(canonical: bool) -> Self {
        if canonical {
            InputMode::Canonical
        } else {
            InputMode::Raw
        }
    }

    pub fn is_canonical(self) -> bool {
        self == InputMode::Canonical
    }
}

/// Minimum bytes a raw-mode read waits for.
pub const RAW_MIN_BYTES: u8 = 1;
/// Inter-byte timeout for raw-mode reads, in deciseconds. Zero disables it.
pub const RAW_TIMEOUT_DECISECONDS: u8 = 0;

/// Control/input/output/local flags plus the control-character table.
///
/// A `LineConfig` held by a port is a cache: it only matches the kernel after
/// it has been applied.
#[derive(Clone)]
pub struct LineConfig {
    termios: Termios,
}

impl LineConfig {
    pub(crate) fn from_termios(termios: Termios) -> Self {
        Self { termios }
    }

    pub(crate) fn termios(&self) -> &Termios {
        &self.termios
    }

    /// Build the running configuration on top of the attributes a device
    /// reported at open time. Flags already present on the device are kept
    /// unless they conflict with 8N1 framing or the requested input mode.
    pub(crate) fn derive(
        found: &LineConfig,
        baud: BaudRate,
        mode: InputMode,
    ) -> SerialResult<Self> {
        let mut config = found.clone();
        config.set_baud(baud)?;

        let t = &mut config.termios;
        t.control_modes &= !(ControlModes::CSIZE | ControlModes::PARENB | ControlModes::CSTOPB);
        t.control_modes |= ControlModes::CS8
            | ControlModes::CLOCAL
            | ControlModes::HUPCL
            | ControlModes::CREAD;
        t.input_modes |= InputModes::IGNPAR;
        t.output_modes = OutputModes::empty();

        match mode {
            InputMode::Canonical => {
                t.local_modes |= LocalModes::ICANON;
            }
            InputMode::Raw => {
                t.local_modes &= !(LocalModes::ICANON | LocalModes::ECHO);
                t.special_codes[SpecialCodeIndex::VMIN] = RAW_MIN_BYTES;
                t.special_codes[SpecialCodeIndex::VTIME] = RAW_TIMEOUT_DECISECONDS;
            }
        }

        Ok(config)
    }

    /// Set input and output speed. Only touches this record, not the device.
    pub(crate) fn set_baud(&mut self, baud: BaudRate) -> SerialResult<()> {
        self.termios
            .set_speed(baud.as_u32())
            .map_err(|errno| SerialError::BaudEncodingFailed {
                baud: baud.as_u32(),
                source: errno.into(),
            })
    }

    pub fn control_modes(&self) -> ControlModes {
        self.termios.control_modes
    }

    pub fn input_modes(&self) -> InputModes {
        self.termios.input_modes
    }

    pub fn output_modes(&self) -> OutputModes {
        self.termios.output_modes
    }

    pub fn local_modes(&self) -> LocalModes {
        self.termios.local_modes
    }

    /// `VMIN`: bytes a non-canonical read waits for.
    pub fn min_bytes(&self) -> u8 {
        self.termios.special_codes[SpecialCodeIndex::VMIN]
    }

    /// `VTIME`: non-canonical inter-byte timeout in deciseconds.
    pub fn timeout_deciseconds(&self) -> u8 {
        self.termios.special_codes[SpecialCodeIndex::VTIME]
    }

    pub fn input_speed(&self) -> u32 {
        self.termios.input_speed()
    }

    pub fn output_speed(&self) -> u32 {
        self.termios.output_speed()
    }

    /// The input speed if it is one of the supported rates.
    pub fn baud(&self) -> Option<BaudRate> {
        BaudRate::try_from(self.input_speed()).ok()
    }

    pub fn is_canonical(&self) -> bool {
        self.termios.local_modes.contains(LocalModes::ICANON)
    }

    pub fn echo_enabled(&self) -> bool {
        self.termios.local_modes.contains(LocalModes::ECHO)
    }

    /// Plain-data copy of the record, suitable for printing or serializing.
    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            input_speed: self.input_speed(),
            output_speed: self.output_speed(),
            control_flags: u64::from(self.control_modes().bits()),
            input_flags: u64::from(self.input_modes().bits()),
            output_flags: u64::from(self.output_modes().bits()),
            local_flags: u64::from(self.local_modes().bits()),
            min_bytes: self.min_bytes(),
            timeout_deciseconds: self.timeout_deciseconds(),
            canonical: self.is_canonical(),
        }
    }
}

impl fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineConfig")
            .field("speed", &self.input_speed())
            .field("control_modes", &self.control_modes())
            .field("input_modes", &self.input_modes())
            .field("output_modes", &self.output_modes())
            .field("local_modes", &self.local_modes())
            .field("vmin", &self.min_bytes())
            .field("vtime", &self.timeout_deciseconds())
            .finish()
    }
}

/// Raw flag words and control characters of a [`LineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub input_speed: u32,
    pub output_speed: u32,
    pub control_flags: u64,
    pub input_flags: u64,
    pub output_flags: u64,
    pub local_flags: u64,
    pub min_bytes: u8,
    pub timeout_deciseconds: u8,
    pub canonical: bool,
}

impl fmt::Display for LineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "c_cflag: {:x}", self.control_flags)?;
        writeln!(f, "c_iflag: {:x}", self.input_flags)?;
        writeln!(f, "c_oflag: {:x}", self.output_flags)?;
        writeln!(f, "c_lflag: {:x}", self.local_flags)?;
        write!(
            f,
            "speed: {}/{} vmin: {} vtime: {} canonical: {}",
            self.input_speed,
            self.output_speed,
            self.min_bytes,
            self.timeout_deciseconds,
            self.canonical
        )
    }
}
