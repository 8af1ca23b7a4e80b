//! The fixed set of supported baud rates.

use crate::error::SerialError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported line speed, in bits per second.
///
/// Only these eight rates are accepted anywhere in the crate. Converting any
/// other number fails with [`SerialError::UnsupportedBaudRate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    /// Every supported rate, slowest first.
    pub const ALL: [BaudRate; 8] = [
        BaudRate::B2400,
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
    ];

    /// The rate in bits per second.
    pub const fn as_u32(self) -> u32 {
        match self {
            BaudRate::B2400 => 2_400,
            BaudRate::B4800 => 4_800,
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B230400 => 230_400,
        }
    }

    /// Whether `rate` is a member of the supported set.
    pub fn is_supported(rate: u32) -> bool {
        Self::try_from(rate).is_ok()
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::B4800
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = SerialError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        BaudRate::ALL
            .into_iter()
            .find(|b| b.as_u32() == rate)
            .ok_or(SerialError::UnsupportedBaudRate(rate))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.as_u32()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}
