//! The ticktty driver layer: a tick-based sleep scheduler and line-oriented
//! terminal drivers built on nothing but mailboxes and context suspension.
//!
//! The layer is hosted by a kernel implementing [`Port`]. [`Drivers::init`]
//! creates the driver state and installs the system-call handlers, and
//! [`Drivers::start_service_processes`] spawns the driver tasks:
//!
//!  - The **clock driver** counts clock interrupts and resumes every sleeping
//!    context whose deadline has been reached.
//!  - One **terminal driver** per unit assembles received bytes into lines and
//!    forwards transmit-ready events to writers.
//!
//! # Example
//!
//! ```rust,ignore
//! let drivers = Drivers::init(port, DriverConfig::INIT)?;
//! drivers.start_service_processes()?;
//!
//! // In a caller context
//! drivers.sleep(2)?;
//! drivers.term_write(Some(b"hello\n"), 6, 0)?;
//! ```
//!
//! [`Port`]: ticktty_core::port::Port
#![cfg_attr(not(test), no_std)] // Link `std` only when building a test (`cfg(test)`)
extern crate alloc;

use alloc::{boxed::Box, format, sync::Arc, vec::Vec};
use core::fmt;
use ticktty_core::{
    error::{MboxError, SleepError, SpawnError, TermReadError, TermWriteError},
    port::Port,
};

mod cfg;
mod clock;
mod error;
mod interrupt;
mod klock;
mod sleep;
mod syscall;
mod term;
#[cfg(test)]
mod test_port;

pub use self::{
    cfg::{ConfigError, DriverConfig, DriverConfigBuilder},
    error::{InitError, PartialWrite},
};

use self::{sleep::SleepScheduler, term::TermUnit};

/// The driver layer.
pub struct Drivers<P: Port> {
    port: Arc<P>,
    config: DriverConfig,
    sleep: SleepScheduler<P>,
    terms: Vec<TermUnit<P>>,
}

impl<P: Port> fmt::Debug for Drivers<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Drivers")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: Port> Drivers<P> {
    /// Initialize the driver layer.
    ///
    /// This creates every mailbox, installs the system-call handlers, and
    /// enables the interrupts of every terminal unit. The driver tasks are
    /// not started until [`Self::start_service_processes`] is called.
    pub fn init(port: Arc<P>, config: DriverConfig) -> Result<Arc<Self>, InitError> {
        config.validate()?;
        log::debug!("initializing drivers: {:?}", config);

        let sleep = SleepScheduler::new(&port, config.ticks_per_second, config.max_proc)?;
        let terms = (0..config.term_units)
            .map(|unit| TermUnit::new(&port, unit, &config))
            .collect::<Result<Vec<_>, MboxError>>()?;

        let this = Arc::new(Self {
            port,
            config,
            sleep,
            terms,
        });

        syscall::install(&this);

        for term in this.terms.iter() {
            term.arm()?;
        }

        Ok(this)
    }

    /// Get the configuration the driver layer was initialized with.
    #[inline]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Spawn the clock driver and one terminal driver per unit.
    pub fn start_service_processes(self: &Arc<Self>) -> Result<(), SpawnError> {
        let this = Arc::clone(self);
        let pid = self.port.spork(
            "ClockDriver",
            Box::new(move || clock::run(&*this.port, &this.sleep)),
        )?;
        log::debug!("clock driver is pid {}", pid);

        for unit in 0..self.terms.len() {
            let this = Arc::clone(self);
            let pid = self.port.spork(
                &format!("TermDriver{}", unit),
                Box::new(move || this.terms[unit].run()),
            )?;
            log::debug!("terminal driver {} is pid {}", unit, pid);
        }

        Ok(())
    }

    /// Suspend the calling context for `seconds` seconds.
    ///
    /// The context resumes at the first clock tick at which
    /// `seconds * ticks_per_second` ticks have elapsed since the call. Zero
    /// seconds resumes it at the next tick.
    pub fn sleep(&self, seconds: i32) -> Result<(), SleepError> {
        self.sleep.sleep(seconds)
    }

    /// Get the number of clock ticks counted so far.
    pub fn ticks(&self) -> Result<u64, SleepError> {
        self.sleep.ticks().map_err(|_| SleepError::BadObjectState)
    }

    /// Get the number of contexts currently sleeping.
    pub fn sleeper_count(&self) -> Result<usize, SleepError> {
        self.sleep
            .sleeper_count()
            .map_err(|_| SleepError::BadObjectState)
    }

    fn term(&self, unit: i32) -> Option<&TermUnit<P>> {
        usize::try_from(unit).ok().and_then(|i| self.terms.get(i))
    }

    /// Read one line from the terminal unit `unit`, blocking until one is
    /// available.
    ///
    /// At most `buffer_size` bytes are copied into `buffer`, and the rest of
    /// the line is discarded. The line includes its terminating newline if it
    /// had one. A NUL byte is stored after the copied bytes if there is room
    /// for it. Returns the number of bytes copied.
    pub fn term_read(
        &self,
        buffer: Option<&mut [u8]>,
        buffer_size: i32,
        unit: i32,
    ) -> Result<usize, TermReadError> {
        let term = self.term(unit).ok_or(TermReadError::BadParam)?;
        let buffer = buffer.ok_or(TermReadError::BadParam)?;
        let limit = match usize::try_from(buffer_size) {
            Ok(x) if x > 0 && !buffer.is_empty() => x,
            _ => return Err(TermReadError::BadParam),
        };

        term.read(buffer, limit)
    }

    /// Write the first `buffer_size` bytes of `buffer` to the terminal unit
    /// `unit`, blocking until every byte has been handed to the device.
    ///
    /// Writes to the same unit are serialized. Returns the number of bytes
    /// written.
    pub fn term_write(
        &self,
        buffer: Option<&[u8]>,
        buffer_size: i32,
        unit: i32,
    ) -> Result<usize, PartialWrite> {
        let bad_param = PartialWrite::new(TermWriteError::BadParam, 0);
        let term = self.term(unit).ok_or(bad_param)?;
        let buffer = buffer.ok_or(bad_param)?;
        let len = match usize::try_from(buffer_size) {
            Ok(x) if x > 0 && !buffer.is_empty() => x.min(buffer.len()),
            _ => return Err(bad_param),
        };

        term.write(&buffer[..len])
    }
}
