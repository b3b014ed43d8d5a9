//! System-call handlers
use alloc::sync::{Arc, Weak};
use ticktty_core::{
    error::ResultCode,
    port::{Port, SyscallHandler},
    syscall::{SyscallNum, Sysargs},
};

use crate::Drivers;

/// Install the handlers of every system call defined by [`SyscallNum`].
///
/// The handlers hold a weak reference to `drivers`. Once it's gone, they
/// fail with [`ResultCode::BadObjectState`].
pub(crate) fn install<P: Port>(drivers: &Arc<Drivers<P>>) {
    for num in SyscallNum::ALL {
        let weak = Arc::downgrade(drivers);
        let handler: SyscallHandler = Arc::new(move |args: &mut Sysargs<'_>| {
            dispatch(&weak, num, args)
        });
        drivers.port.install_syscall(num, handler);
    }
}

fn dispatch<P: Port>(drivers: &Weak<Drivers<P>>, num: SyscallNum, args: &mut Sysargs<'_>) {
    if args.number() != num {
        log::error!(
            "system call {:?} received an argument block for {:?}",
            num,
            args.number()
        );
        args.set_result(ResultCode::BadParam);
        return;
    }

    let Some(drivers) = drivers.upgrade() else {
        log::debug!("system call {:?} after the drivers were dropped", num);
        args.set_result(ResultCode::BadObjectState);
        return;
    };

    match args {
        Sysargs::Sleep { seconds, result } => {
            *result = ResultCode::from(drivers.sleep(*seconds));
        }

        Sysargs::TermRead {
            buffer,
            buffer_size,
            unit,
            chars_read,
            result,
        } => match drivers.term_read(buffer.as_deref_mut(), *buffer_size, *unit) {
            Ok(count) => {
                *chars_read = count as i32;
                *result = ResultCode::Success;
            }
            Err(e) => {
                *chars_read = 0;
                *result = ResultCode::from(e);
            }
        },

        Sysargs::TermWrite {
            buffer,
            buffer_size,
            unit,
            chars_written,
            result,
        } => match drivers.term_write(*buffer, *buffer_size, *unit) {
            Ok(count) => {
                *chars_written = count as i32;
                *result = ResultCode::Success;
            }
            Err(e) => {
                *chars_written = e.written as i32;
                *result = ResultCode::from(e.error);
            }
        },

        // Disk services are reserved; they succeed without doing anything
        Sysargs::DiskRead { result, .. }
        | Sysargs::DiskWrite { result, .. }
        | Sysargs::DiskSize { result, .. } => {
            log::trace!("system call {:?} is not implemented", num);
            *result = ResultCode::Success;
        }
    }
}
