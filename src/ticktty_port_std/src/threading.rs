//! Contexts backed by host threads
//!
//! Every host thread becomes a context with a process ID the first time it
//! asks for one. Contexts are registered in a process-wide table so that any
//! thread can resume any other.
use once_cell::sync::Lazy;
use spin::Mutex as SpinMutex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        mpsc, Arc, Weak,
    },
    thread::{self, JoinHandle},
};
use ticktty_core::{
    error::{SpawnError, UnblockError},
    port::{BlockReason, Pid, TaskEntry},
};

static NEXT_PID: AtomicI32 = AtomicI32::new(1);

static PROCESSES: Lazy<SpinMutex<HashMap<Pid, Weak<Context>>>> =
    Lazy::new(|| SpinMutex::new(HashMap::new()));

thread_local! {
    static CURRENT: Arc<Context> = Context::register();
}

/// A context.
#[derive(Debug)]
pub(crate) struct Context {
    pid: Pid,
    thread: thread::Thread,
    /// Set by `unblock`, consumed by `block`.
    wake: AtomicBool,
}

impl Context {
    fn register() -> Arc<Self> {
        let pid = NEXT_PID.fetch_add(1, Ordering::Relaxed);
        let this = Arc::new(Self {
            pid,
            thread: thread::current(),
            wake: AtomicBool::new(false),
        });
        PROCESSES.lock().insert(pid, Arc::downgrade(&this));
        log::trace!("registered {:?} as pid {}", this.thread.name(), pid);
        this
    }

    fn unblock(&self) {
        self.wake.store(true, Ordering::Release);
        self.thread.unpark();
    }

    fn block(&self) {
        while !self.wake.swap(false, Ordering::Acquire) {
            thread::park();
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        PROCESSES.lock().remove(&self.pid);
    }
}

/// Get the process ID of the calling thread.
pub(crate) fn current_pid() -> Pid {
    CURRENT.with(|ctx| ctx.pid)
}

/// Block the calling thread until [`unblock`] is called for it.
pub(crate) fn block_me(reason: BlockReason) {
    CURRENT.with(|ctx| {
        log::trace!("pid {} blocks ({:?})", ctx.pid, reason);
        ctx.block();
        log::trace!("pid {} resumes", ctx.pid);
    })
}

/// Resume the context `pid`.
pub(crate) fn unblock(pid: Pid) -> Result<(), UnblockError> {
    let ctx = PROCESSES
        .lock()
        .get(&pid)
        .and_then(Weak::upgrade)
        .ok_or(UnblockError::BadPid)?;
    ctx.unblock();
    Ok(())
}

/// Spawn a named thread running `entry` and return its process ID.
pub(crate) fn spawn(name: &str, entry: TaskEntry) -> Result<(Pid, JoinHandle<()>), SpawnError> {
    let (send, recv) = mpsc::channel();

    let handle = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            // The receiver is only gone if `spawn` has already failed
            let _ = send.send(current_pid());
            drop(send);
            entry();
        })
        .map_err(|e| {
            log::error!("could not spawn {:?}: {}", name, e);
            SpawnError::OutOfResources
        })?;

    let pid = recv.recv().map_err(|_| SpawnError::OutOfResources)?;
    Ok((pid, handle))
}
