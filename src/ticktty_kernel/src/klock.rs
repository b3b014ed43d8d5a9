//! Mailbox handles and the mailbox-based locking mechanism
use alloc::sync::Arc;
use core::{fmt, ops};
use ticktty_core::{
    error::MboxError,
    port::{MboxId, Port},
};

/// An owned mailbox. Released when dropped.
pub(crate) struct Mailbox<P: Port> {
    port: Arc<P>,
    id: MboxId,
}

impl<P: Port> Mailbox<P> {
    /// Create a mailbox with `slots` slots of `slot_size` bytes.
    pub(crate) fn new(port: &Arc<P>, slots: usize, slot_size: usize) -> Result<Self, MboxError> {
        let id = port.mbox_create(slots, slot_size)?;
        log::trace!("created mailbox {} ({} x {} bytes)", id, slots, slot_size);
        Ok(Self {
            port: Arc::clone(port),
            id,
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> MboxId {
        self.id
    }

    #[inline]
    pub(crate) fn send(&self, msg: &[u8]) -> Result<(), MboxError> {
        self.port.mbox_send(self.id, msg)
    }

    #[inline]
    pub(crate) fn recv(&self, buf: &mut [u8]) -> Result<usize, MboxError> {
        self.port.mbox_recv(self.id, buf)
    }

    #[inline]
    pub(crate) fn cond_send(&self, msg: &[u8]) -> Result<(), MboxError> {
        self.port.mbox_cond_send(self.id, msg)
    }

    #[inline]
    pub(crate) fn cond_recv(&self, buf: &mut [u8]) -> Result<usize, MboxError> {
        self.port.mbox_cond_recv(self.id, buf)
    }
}

impl<P: Port> Drop for Mailbox<P> {
    fn drop(&mut self) {
        // The port may have released it already during shutdown
        if let Err(e) = self.port.mbox_release(self.id) {
            log::debug!("mailbox {} was not released: {:?}", self.id, e);
        }
    }
}

impl<P: Port> fmt::Debug for Mailbox<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Mailbox").field(&self.id).finish()
    }
}

/// A mutual-exclusion lock built on a single-slot mailbox.
///
/// Holding the lock means having deposited the only message the mailbox can
/// hold. Unlocking takes the message back out. The protected data lives in a
/// [`spin::Mutex`] that is only ever accessed with `try_lock` while the token
/// is held, so contention on it indicates a broken locking protocol.
pub(crate) struct MboxLock<P: Port, T> {
    token: Mailbox<P>,
    data: spin::Mutex<T>,
}

impl<P: Port, T> MboxLock<P, T> {
    pub(crate) fn new(port: &Arc<P>, x: T) -> Result<Self, MboxError> {
        Ok(Self {
            token: Mailbox::new(port, 1, 0)?,
            data: spin::Mutex::new(x),
        })
    }

    /// Acquire the lock, blocking the calling context while another context
    /// holds it.
    pub(crate) fn lock(&self) -> Result<MboxLockGuard<'_, P, T>, MboxError> {
        self.token.send(&[])?;

        let Some(data) = self.data.try_lock() else {
            protocol_violation(self.token.id(), "data is in use although the token was acquired");
        };

        Ok(MboxLockGuard {
            lock: self,
            data: Some(data),
        })
    }
}

impl<P: Port, T> fmt::Debug for MboxLock<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MboxLock")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// RAII guard for [`MboxLock`]. Returns the token when dropped.
pub(crate) struct MboxLockGuard<'a, P: Port, T> {
    lock: &'a MboxLock<P, T>,
    /// `None` only while being dropped.
    data: Option<spin::MutexGuard<'a, T>>,
}

impl<P: Port, T: fmt::Debug> fmt::Debug for MboxLockGuard<'_, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MboxLockGuard")
            .field("token", &self.lock.token)
            .field("data", &self.data.as_deref())
            .finish()
    }
}

impl<P: Port, T> Drop for MboxLockGuard<'_, P, T> {
    fn drop(&mut self) {
        // The data must become available before the token does
        drop(self.data.take());

        match self.lock.token.cond_recv(&mut []) {
            Ok(_) => {}
            Err(MboxError::Released) | Err(MboxError::BadId) => {
                log::debug!(
                    "mailbox {} was released while locked",
                    self.lock.token.id()
                );
            }
            Err(e) => protocol_violation(
                self.lock.token.id(),
                match e {
                    MboxError::WouldBlock => "the token is missing on unlock",
                    _ => "the token could not be taken back",
                },
            ),
        }
    }
}

impl<P: Port, T> ops::Deref for MboxLockGuard<'_, P, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        match &self.data {
            Some(data) => data,
            None => unreachable!(),
        }
    }
}

impl<P: Port, T> ops::DerefMut for MboxLockGuard<'_, P, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.data {
            Some(data) => data,
            None => unreachable!(),
        }
    }
}

#[cold]
fn protocol_violation(mbox: MboxId, what: &str) -> ! {
    log::error!("mailbox lock {}: {}", mbox, what);
    panic!("mailbox lock protocol violation: {}", what);
}
