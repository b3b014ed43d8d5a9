//! Error types specific to the driver layer
use core::fmt;
use ticktty_core::error::{DeviceError, MboxError, TermWriteError};

use crate::cfg::ConfigError;

/// Error type for [`Drivers::init`].
///
/// [`Drivers::init`]: crate::Drivers::init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The configuration is invalid.
    Config(ConfigError),
    /// A mailbox couldn't be created.
    Mailbox(MboxError),
    /// A terminal unit rejected the control word arming its interrupts.
    Device(DeviceError),
}

impl From<ConfigError> for InitError {
    fn from(x: ConfigError) -> Self {
        Self::Config(x)
    }
}

impl From<MboxError> for InitError {
    fn from(x: MboxError) -> Self {
        Self::Mailbox(x)
    }
}

impl From<DeviceError> for InitError {
    fn from(x: DeviceError) -> Self {
        Self::Device(x)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {:?}", e),
            Self::Mailbox(e) => write!(f, "could not create a mailbox: {:?}", e),
            Self::Device(e) => write!(f, "could not arm a terminal unit: {:?}", e),
        }
    }
}

/// Error type for [`Drivers::term_write`]. Carries the number of bytes that
/// were transmitted before the failure.
///
/// [`Drivers::term_write`]: crate::Drivers::term_write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialWrite {
    pub error: TermWriteError,
    pub written: usize,
}

impl PartialWrite {
    #[inline]
    pub(crate) const fn new(error: TermWriteError, written: usize) -> Self {
        Self { error, written }
    }
}
