//! The interface between the driver layer and the host kernel.
//!
//! The driver layer never suspends, spawns, or synchronizes on its own. Every
//! such operation goes through one of the traits defined here, which a host
//! kernel implements once. [`Port`] bundles them together.
use alloc::{boxed::Box, sync::Arc};

use crate::{
    device::DeviceClass,
    error::{DeviceError, MboxError, SpawnError, UnblockError},
    syscall::{SyscallNum, Sysargs},
};

/// Identifies a process (an execution context) of the host kernel.
pub type Pid = i32;

/// Identifies a mailbox created by [`PortMailbox::mbox_create`].
pub type MboxId = i32;

/// The entry point of a process created by [`PortThreading::spork`].
pub type TaskEntry = Box<dyn FnOnce() + Send + 'static>;

/// A system-call handler installed by [`PortSyscall::install_syscall`].
pub type SyscallHandler = Arc<dyn Fn(&mut Sysargs<'_>) + Send + Sync + 'static>;

/// An opaque code describing why a process blocked itself. Host kernels use
/// it for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockReason(pub i32);

impl BlockReason {
    /// The process is waiting for a sleep request to expire.
    pub const SLEEP: Self = Self(12);
}

/// Process management.
pub trait PortThreading {
    /// Get the process ID of the calling context.
    fn current_pid(&self) -> Pid;

    /// Suspend the calling context until [`Self::unblock_proc`] is called
    /// for it.
    ///
    /// An `unblock_proc` that arrives between the decision to block and the
    /// call to this method must not be lost; the call then returns
    /// immediately.
    fn block_me(&self, reason: BlockReason);

    /// Resume a process suspended by [`Self::block_me`].
    ///
    /// This method never blocks, so it may be called while holding a mailbox
    /// lock.
    fn unblock_proc(&self, pid: Pid) -> Result<(), UnblockError>;

    /// Create a long-running process executing `entry`.
    fn spork(&self, name: &str, entry: TaskEntry) -> Result<Pid, SpawnError>;
}

/// Mailboxes, the only synchronization primitive available to the driver
/// layer.
///
/// A mailbox has a fixed number of slots, each holding one message of at most
/// `slot_size` bytes.
///
///  - A mailbox with one slot and zero-sized messages works as a lock token.
///  - A mailbox with zero slots is a rendezvous channel: a send only completes
///    when a receiver is waiting.
///  - A mailbox with `n` slots is a bounded FIFO queue.
pub trait PortMailbox {
    /// Create a mailbox.
    fn mbox_create(&self, slots: usize, slot_size: usize) -> Result<MboxId, MboxError>;

    /// Send a message, blocking until there's room for it (or, for a
    /// rendezvous mailbox, until a receiver takes it).
    fn mbox_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError>;

    /// Receive a message into `buf`, blocking until one is available. Returns
    /// the length of the message.
    fn mbox_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError>;

    /// Send a message if it can be done without blocking. Returns
    /// [`MboxError::WouldBlock`] otherwise.
    fn mbox_cond_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError>;

    /// Receive a message if one is available without blocking. Returns
    /// [`MboxError::WouldBlock`] otherwise.
    fn mbox_cond_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError>;

    /// Release a mailbox. Blocked operations fail with
    /// [`MboxError::Released`].
    fn mbox_release(&self, mbox: MboxId) -> Result<(), MboxError>;
}

/// Device access.
pub trait PortDevice {
    /// Block until the specified device unit raises an interrupt, and return
    /// the device status word.
    fn wait_device(&self, class: DeviceClass, unit: usize) -> Result<u32, DeviceError>;

    /// Issue a control word to the specified device unit.
    fn device_output(
        &self,
        class: DeviceClass,
        unit: usize,
        control: u32,
    ) -> Result<(), DeviceError>;
}

/// The system-call dispatch table.
pub trait PortSyscall {
    /// Install (or replace) the handler for the system call `num`.
    fn install_syscall(&self, num: SyscallNum, handler: SyscallHandler);
}

/// The umbrella trait for everything the driver layer needs from the host
/// kernel. Implemented automatically.
pub trait Port:
    PortThreading + PortMailbox + PortDevice + PortSyscall + Send + Sync + 'static
{
}

impl<T> Port for T where
    T: PortThreading + PortMailbox + PortDevice + PortSyscall + Send + Sync + 'static
{
}
