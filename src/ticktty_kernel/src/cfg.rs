//! Configuration of the driver layer
use ticktty_core::{device::TERM_UNITS, utils::Init};

/// The parameters of the driver layer, fixed at [`Drivers::init`].
///
/// [`Drivers::init`]: crate::Drivers::init
///
/// # Examples
///
/// ```
/// use ticktty_kernel::DriverConfig;
/// const CFG: DriverConfig = DriverConfig::build()
///     .ticks_per_second(20)
///     .term_units(2)
///     .finish();
/// assert_eq!(CFG.ticks_per_second, 20);
/// assert_eq!(CFG.max_line, 80);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// The number of clock ticks making up one second of sleep.
    pub ticks_per_second: u32,
    /// The maximum number of concurrently existing processes. Bounds the
    /// number of pending sleep requests.
    pub max_proc: usize,
    /// The number of terminal units served.
    pub term_units: usize,
    /// The capacity of a line buffer. A line reaching this length is
    /// delivered without waiting for a newline.
    pub max_line: usize,
    /// The number of completed lines buffered per terminal unit.
    pub line_queue_slots: usize,
}

impl Init for DriverConfig {
    const INIT: Self = Self {
        ticks_per_second: 10,
        max_proc: 50,
        term_units: TERM_UNITS,
        max_line: 80,
        line_queue_slots: 10,
    };
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::INIT
    }
}

/// The builder for [`DriverConfig`]. Created by [`DriverConfig::build`].
#[must_use = "call `finish` to get a `DriverConfig`"]
pub struct DriverConfigBuilder {
    inner: DriverConfig,
}

/// Error type for [`DriverConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `ticks_per_second` is zero.
    ZeroTickRate,
    /// `max_proc` is zero.
    ZeroMaxProc,
    /// `max_line` is zero.
    ZeroMaxLine,
    /// `line_queue_slots` is zero.
    ZeroLineQueue,
}

impl DriverConfig {
    /// Construct a builder, starting from the default values.
    pub const fn build() -> DriverConfigBuilder {
        DriverConfigBuilder { inner: Self::INIT }
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_second == 0 {
            Err(ConfigError::ZeroTickRate)
        } else if self.max_proc == 0 {
            Err(ConfigError::ZeroMaxProc)
        } else if self.max_line == 0 {
            Err(ConfigError::ZeroMaxLine)
        } else if self.line_queue_slots == 0 {
            Err(ConfigError::ZeroLineQueue)
        } else {
            Ok(())
        }
    }
}

impl DriverConfigBuilder {
    /// Specify the tick rate. Defaults to `10` when unspecified.
    pub const fn ticks_per_second(self, value: u32) -> Self {
        Self {
            inner: DriverConfig {
                ticks_per_second: value,
                ..self.inner
            },
        }
    }

    /// Specify the process limit. Defaults to `50` when unspecified.
    pub const fn max_proc(self, value: usize) -> Self {
        Self {
            inner: DriverConfig {
                max_proc: value,
                ..self.inner
            },
        }
    }

    /// Specify the number of terminal units. Defaults to [`TERM_UNITS`] when
    /// unspecified.
    pub const fn term_units(self, value: usize) -> Self {
        Self {
            inner: DriverConfig {
                term_units: value,
                ..self.inner
            },
        }
    }

    /// Specify the line buffer capacity. Defaults to `80` when unspecified.
    pub const fn max_line(self, value: usize) -> Self {
        Self {
            inner: DriverConfig {
                max_line: value,
                ..self.inner
            },
        }
    }

    /// Specify the number of buffered lines per unit. Defaults to `10` when
    /// unspecified.
    pub const fn line_queue_slots(self, value: usize) -> Self {
        Self {
            inner: DriverConfig {
                line_queue_slots: value,
                ..self.inner
            },
        }
    }

    /// Complete the definition.
    pub const fn finish(self) -> DriverConfig {
        self.inner
    }
}
