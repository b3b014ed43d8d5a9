//! The port-facing API of the ticktty driver layer.
//!
//! This crate defines everything that sits between the driver layer
//! (`ticktty_kernel`) and the host kernel it runs on:
//!
//!  - [`port`]: the traits a host kernel implements to provide context
//!    suspension, mailboxes, device access, and the system-call table.
//!  - [`device`]: device classes and the encoding of terminal status and
//!    control words.
//!  - [`syscall`]: system-call numbers and the typed argument block passed to
//!    a system-call handler.
//!  - [`error`]: result codes and the error types of every service call.
//!
//! # Contexts
//!
//! The driver layer distinguishes two kinds of execution contexts, both of
//! which are ordinary host-kernel processes identified by a [`Pid`]:
//!
//!  - **Driver tasks** are long-running processes created by the driver layer
//!    itself through [`PortThreading::spork`]. They only block in
//!    [`PortDevice::wait_device`].
//!  - **Caller contexts** are the processes invoking service calls. They may
//!    block in a mailbox operation or in [`PortThreading::block_me`].
//!
//! [`Pid`]: port::Pid
//! [`PortThreading::spork`]: port::PortThreading::spork
//! [`PortThreading::block_me`]: port::PortThreading::block_me
//! [`PortDevice::wait_device`]: port::PortDevice::wait_device
#![cfg_attr(not(test), no_std)] // Link `std` only when building a test (`cfg(test)`)
extern crate alloc;

pub mod device;
pub mod error;
pub mod port;
pub mod syscall;
pub mod utils;

/// The prelude module.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        error::ResultCode,
        port::{Port, PortDevice, PortMailbox, PortSyscall, PortThreading},
        utils::Init,
    };
}
