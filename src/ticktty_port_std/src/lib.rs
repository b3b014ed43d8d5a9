//! Simulation environment for running the ticktty driver layer on a hosted
//! environment.
//!
//! [`StdPort`] implements every port trait on top of host threads:
//!
//!  - Every host thread is a context. [`spork`] spawns a named thread.
//!  - Mailboxes and interrupt lines block on `parking_lot::{Mutex, Condvar}`.
//!  - A clock device and a number of terminal devices are simulated. They can
//!    be driven step by step ([`SimClock::tick`], [`SimTerminal::step`]) or
//!    left free-running by setting [`SimConfig::clock_period`] and
//!    [`SimConfig::term_period`].
//!  - System calls are dispatched through a table indexed by [`SyscallNum`].
//!    The `sys_*` methods marshal the arguments of each call.
//!
//! # Example
//!
//! ```no_run
//! use ticktty_core::utils::Init;
//! use ticktty_kernel::DriverConfig;
//! use ticktty_port_std::{boot, SimConfig, StdPort};
//!
//! let port = StdPort::new(SimConfig::INIT);
//! let _drivers = boot(&port, DriverConfig::INIT).unwrap();
//! port.sys_term_write(b"hello\n", 0);
//! port.shutdown();
//! ```
//!
//! [`spork`]: ticktty_core::port::PortThreading::spork
use spin::Mutex as SpinMutex;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use ticktty_core::{
    device::{DeviceClass, TERM_UNITS},
    error::{DeviceError, MboxError, ResultCode, SpawnError, UnblockError},
    port::{
        BlockReason, MboxId, Pid, PortDevice, PortMailbox, PortSyscall, PortThreading,
        SyscallHandler, TaskEntry,
    },
    syscall::{SyscallNum, Sysargs, NUM_SYSCALLS},
    utils::Init,
};
use ticktty_kernel::{DriverConfig, Drivers, InitError};

mod device;
mod mailbox;
mod threading;

pub use self::device::{InterruptLine, SimClock, SimTerminal};
pub use self::mailbox::MAX_MAILBOXES;

pub extern crate env_logger;

/// The parameters of the simulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// The interval between clock interrupts. `None` means the clock only
    /// ticks when [`SimClock::tick`] is called.
    pub clock_period: Option<Duration>,
    /// The interval at which every terminal is stepped. `None` means
    /// terminals only generate interrupts when [`SimTerminal::step`] is
    /// called.
    pub term_period: Option<Duration>,
    /// The number of terminal devices.
    pub term_units: usize,
    /// Feed transmitted bytes back as input on every terminal.
    pub loopback: bool,
}

impl Init for SimConfig {
    const INIT: Self = Self {
        clock_period: None,
        term_period: None,
        term_units: TERM_UNITS,
        loopback: false,
    };
}

impl SimConfig {
    /// A configuration with free-running devices.
    pub const fn free_running() -> Self {
        Self {
            clock_period: Some(Duration::from_millis(2)),
            term_period: Some(Duration::from_millis(1)),
            ..Self::INIT
        }
    }

    pub const fn with_term_units(self, term_units: usize) -> Self {
        Self { term_units, ..self }
    }

    pub const fn with_loopback(self, loopback: bool) -> Self {
        Self { loopback, ..self }
    }
}

/// The simulated host kernel.
pub struct StdPort {
    config: SimConfig,
    mailboxes: mailbox::MailboxTable,
    clock: SimClock,
    terms: Vec<SimTerminal>,
    syscalls: SpinMutex<[Option<SyscallHandler>; NUM_SYSCALLS]>,
    /// Every process ID passed to a successful `unblock_proc`, in order.
    unblock_history: SpinMutex<Vec<Pid>>,
    /// The threads started by `spork`.
    tasks: SpinMutex<Vec<JoinHandle<()>>>,
    shutdown: AtomicBool,
}

impl fmt::Debug for StdPort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StdPort")
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

/// Error type for [`boot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    Init(InitError),
    Spawn(SpawnError),
}

impl From<InitError> for BootError {
    fn from(x: InitError) -> Self {
        Self::Init(x)
    }
}

impl From<SpawnError> for BootError {
    fn from(x: SpawnError) -> Self {
        Self::Spawn(x)
    }
}

/// Initialize the driver layer on `port`, start its driver tasks, and start
/// the free-running devices, if any.
pub fn boot(port: &Arc<StdPort>, config: DriverConfig) -> Result<Arc<Drivers<StdPort>>, BootError> {
    let drivers = Drivers::init(Arc::clone(port), config)?;
    drivers.start_service_processes()?;
    port.run_devices();
    log::debug!("booted");
    Ok(drivers)
}

impl StdPort {
    pub fn new(config: SimConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            mailboxes: mailbox::MailboxTable::new(),
            clock: SimClock::default(),
            terms: (0..config.term_units)
                .map(|unit| SimTerminal::new(unit, config.loopback))
                .collect(),
            syscalls: SpinMutex::new(Default::default()),
            unblock_history: SpinMutex::new(Vec::new()),
            tasks: SpinMutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Get the terminal device `unit`.
    ///
    /// # Panics
    ///
    /// Panics if `unit` is out of range.
    pub fn terminal(&self, unit: usize) -> &SimTerminal {
        &self.terms[unit]
    }

    /// Get every process ID resumed so far, in order.
    pub fn unblock_history(&self) -> Vec<Pid> {
        self.unblock_history.lock().clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Start the threads generating interrupts for the free-running devices.
    fn run_devices(self: &Arc<Self>) {
        if let Some(period) = self.config.clock_period {
            let this = Arc::clone(self);
            thread::spawn(move || {
                while !this.is_shutdown() {
                    thread::sleep(period);
                    if !this.clock.tick() {
                        break;
                    }
                }
                log::trace!("clock thread stopped");
            });
        }

        if let Some(period) = self.config.term_period {
            let this = Arc::clone(self);
            thread::spawn(move || {
                while !this.is_shutdown() {
                    thread::sleep(period);
                    for term in this.terms.iter() {
                        term.step();
                    }
                }
                log::trace!("terminal thread stopped");
            });
        }
    }

    /// Stop the simulated machine.
    ///
    /// Every pending and future `wait_device` fails with
    /// [`DeviceError::Shutdown`]. Once the tasks started by `spork` have
    /// exited, the system-call table is cleared and every mailbox is
    /// released, which fails the calls still blocked in a mailbox.
    ///
    /// Must not be called from a task started by `spork`.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("shutting down");

        self.clock.line().shutdown();
        for term in self.terms.iter() {
            term.line().shutdown();
        }

        // The clock driver resumes the remaining sleepers before it exits,
        // which needs the mailboxes
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let name = task.thread().name().unwrap_or("<unnamed>").to_owned();
            if task.join().is_err() {
                log::error!("task {:?} panicked", name);
            }
        }

        // Drop the handlers outside the lock
        let handlers = std::mem::take(&mut *self.syscalls.lock());
        drop(handlers);

        self.mailboxes.release_all();
    }

    /// Invoke the system call specified by `args`.
    ///
    /// Fails with [`ResultCode::BadObjectState`] if no handler is installed.
    pub fn syscall(&self, args: &mut Sysargs<'_>) {
        let num = args.number();
        let handler = self.syscalls.lock()[num.index()].clone();
        match handler {
            Some(handler) => handler(args),
            None => {
                log::warn!("system call {:?} is not installed", num);
                args.set_result(ResultCode::BadObjectState);
            }
        }
    }

    /// Sleep for `seconds` seconds.
    pub fn sys_sleep(&self, seconds: i32) -> ResultCode {
        let mut args = Sysargs::sleep(seconds);
        self.syscall(&mut args);
        args.result()
    }

    /// Read a line from the terminal `unit` into `buffer`. Returns the result
    /// code and the number of bytes read.
    pub fn sys_term_read(&self, buffer: &mut [u8], unit: i32) -> (ResultCode, usize) {
        let size = i32::try_from(buffer.len()).unwrap_or(i32::MAX);
        let mut args = Sysargs::term_read(Some(buffer), size, unit);
        self.syscall(&mut args);
        match args {
            Sysargs::TermRead {
                chars_read, result, ..
            } => (result, chars_read as usize),
            _ => unreachable!(),
        }
    }

    /// Write `buffer` to the terminal `unit`. Returns the result code and the
    /// number of bytes written.
    pub fn sys_term_write(&self, buffer: &[u8], unit: i32) -> (ResultCode, usize) {
        let size = i32::try_from(buffer.len()).unwrap_or(i32::MAX);
        let mut args = Sysargs::term_write(Some(buffer), size, unit);
        self.syscall(&mut args);
        match args {
            Sysargs::TermWrite {
                chars_written,
                result,
                ..
            } => (result, chars_written as usize),
            _ => unreachable!(),
        }
    }

    /// Returns the result code and the status.
    pub fn sys_disk_read(
        &self,
        buffer: &mut [u8],
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
    ) -> (ResultCode, i32) {
        let mut args = Sysargs::disk_read(Some(buffer), unit, track, first, sectors);
        self.syscall(&mut args);
        match args {
            Sysargs::DiskRead { status, result, .. } => (result, status),
            _ => unreachable!(),
        }
    }

    /// Returns the result code and the status.
    pub fn sys_disk_write(
        &self,
        buffer: &[u8],
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
    ) -> (ResultCode, i32) {
        let mut args = Sysargs::disk_write(Some(buffer), unit, track, first, sectors);
        self.syscall(&mut args);
        match args {
            Sysargs::DiskWrite { status, result, .. } => (result, status),
            _ => unreachable!(),
        }
    }

    /// Returns the result code, the sector size, the number of sectors per
    /// track, and the number of tracks.
    pub fn sys_disk_size(&self, unit: i32) -> (ResultCode, i32, i32, i32) {
        let mut args = Sysargs::disk_size(unit);
        self.syscall(&mut args);
        match args {
            Sysargs::DiskSize {
                sector,
                track,
                disk,
                result,
                ..
            } => (result, sector, track, disk),
            _ => unreachable!(),
        }
    }
}

impl PortThreading for StdPort {
    fn current_pid(&self) -> Pid {
        threading::current_pid()
    }

    fn block_me(&self, reason: BlockReason) {
        threading::block_me(reason)
    }

    fn unblock_proc(&self, pid: Pid) -> Result<(), UnblockError> {
        threading::unblock(pid)?;
        self.unblock_history.lock().push(pid);
        Ok(())
    }

    fn spork(&self, name: &str, entry: TaskEntry) -> Result<Pid, SpawnError> {
        let (pid, handle) = threading::spawn(name, entry)?;
        log::debug!("spork({:?}) = {}", name, pid);
        self.tasks.lock().push(handle);
        Ok(pid)
    }
}

impl PortMailbox for StdPort {
    fn mbox_create(&self, slots: usize, slot_size: usize) -> Result<MboxId, MboxError> {
        if self.is_shutdown() {
            return Err(MboxError::BadParam);
        }
        self.mailboxes.create(slots, slot_size)
    }

    fn mbox_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError> {
        self.mailboxes.send(mbox, msg, true)
    }

    fn mbox_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError> {
        self.mailboxes.recv(mbox, buf, true)
    }

    fn mbox_cond_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError> {
        self.mailboxes.send(mbox, msg, false)
    }

    fn mbox_cond_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError> {
        self.mailboxes.recv(mbox, buf, false)
    }

    fn mbox_release(&self, mbox: MboxId) -> Result<(), MboxError> {
        self.mailboxes.release(mbox)
    }
}

impl PortDevice for StdPort {
    fn wait_device(&self, class: DeviceClass, unit: usize) -> Result<u32, DeviceError> {
        let line = match class {
            DeviceClass::Clock if unit == 0 => self.clock.line(),
            DeviceClass::Terminal => self.terms.get(unit).ok_or(DeviceError::BadUnit)?.line(),
            _ => return Err(DeviceError::BadUnit),
        };
        line.wait()
    }

    fn device_output(
        &self,
        class: DeviceClass,
        unit: usize,
        control: u32,
    ) -> Result<(), DeviceError> {
        match class {
            DeviceClass::Terminal => self
                .terms
                .get(unit)
                .ok_or(DeviceError::BadUnit)?
                .output(control),
            _ => Err(DeviceError::BadUnit),
        }
    }
}

impl PortSyscall for StdPort {
    fn install_syscall(&self, num: SyscallNum, handler: SyscallHandler) {
        log::trace!("install_syscall({:?})", num);
        self.syscalls.lock()[num.index()] = Some(handler);
    }
}
