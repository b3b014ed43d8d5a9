//! The sleep scheduler
//!
//! Pending sleep requests form a wait queue ordered by their deadlines. The
//! queue and the tick counter are protected by one [`MboxLock`], which is
//! taken by [`SleepScheduler::sleep`] (to enqueue) and by the clock driver
//! (to advance time and release due requests).
use alloc::sync::Arc;
use slab::Slab;
use ticktty_core::{
    error::{MboxError, SleepError},
    port::{BlockReason, Pid, Port},
};

use crate::klock::{MboxLock, MboxLockGuard};

/// A pending sleep request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SleepRequest {
    pub(crate) pid: Pid,
    /// The tick count at which the request becomes due.
    pub(crate) deadline: u64,
    next: Option<usize>,
}

/// The wait queue of sleep requests, sorted by deadline in ascending order.
/// Requests with an equal deadline are kept in insertion order.
///
/// Requests are stored in an arena and linked through their slot indices.
#[derive(Debug)]
pub(crate) struct SleepQueue {
    requests: Slab<SleepRequest>,
    head: Option<usize>,
    capacity: usize,
}

impl SleepQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            requests: Slab::with_capacity(capacity),
            head: None,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    /// Insert a request for `pid`.
    ///
    /// Fails with [`SleepError::QueueOverflow`] if the queue is full and with
    /// [`SleepError::BadObjectState`] if `pid` already has a pending request.
    pub(crate) fn insert(&mut self, pid: Pid, deadline: u64) -> Result<(), SleepError> {
        if self.requests.len() >= self.capacity {
            return Err(SleepError::QueueOverflow);
        }
        if self.requests.iter().any(|(_, req)| req.pid == pid) {
            return Err(SleepError::BadObjectState);
        }

        // Find the last request that must precede the new one
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(i) = cursor {
            let req = &self.requests[i];
            if req.deadline > deadline {
                break;
            }
            prev = Some(i);
            cursor = req.next;
        }

        let new = self.requests.insert(SleepRequest {
            pid,
            deadline,
            next: cursor,
        });

        match prev {
            Some(i) => self.requests[i].next = Some(new),
            None => self.head = Some(new),
        }

        Ok(())
    }

    /// Remove and return the first request if it's due at `now`.
    pub(crate) fn pop_due(&mut self, now: u64) -> Option<SleepRequest> {
        let i = self.head?;
        if self.requests[i].deadline > now {
            return None;
        }
        let req = self.requests.remove(i);
        self.head = req.next;
        Some(req)
    }

    /// Iterate over the pending requests in wake-up order.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &SleepRequest> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let req = &self.requests[cursor?];
            cursor = req.next;
            Some(req)
        })
    }
}

/// The state protected by the sleep lock.
#[derive(Debug)]
struct SleepState {
    ticks: u64,
    queue: SleepQueue,
    /// Set when the clock driver stops. No request is queued afterwards.
    shut_down: bool,
}

/// The sleep facility.
pub(crate) struct SleepScheduler<P: Port> {
    port: Arc<P>,
    ticks_per_second: u64,
    state: MboxLock<P, SleepState>,
}

impl<P: Port> SleepScheduler<P> {
    pub(crate) fn new(
        port: &Arc<P>,
        ticks_per_second: u32,
        max_proc: usize,
    ) -> Result<Self, MboxError> {
        Ok(Self {
            port: Arc::clone(port),
            ticks_per_second: ticks_per_second as u64,
            state: MboxLock::new(
                port,
                SleepState {
                    ticks: 0,
                    queue: SleepQueue::new(max_proc),
                    shut_down: false,
                },
            )?,
        })
    }

    /// Suspend the calling context for `seconds` seconds.
    ///
    /// Fails with [`SleepError::BadObjectState`] if the clock driver has
    /// stopped, either before the call or while the caller was waiting.
    pub(crate) fn sleep(&self, seconds: i32) -> Result<(), SleepError> {
        let seconds = u64::try_from(seconds).map_err(|_| SleepError::BadParam)?;
        let pid = self.port.current_pid();

        {
            let mut st = self.lock_for_sleep()?;
            if st.shut_down {
                return Err(SleepError::BadObjectState);
            }
            let deadline = st
                .ticks
                .saturating_add(seconds.saturating_mul(self.ticks_per_second));
            st.queue.insert(pid, deadline)?;
            log::trace!(
                "sleep: pid {} waits until tick {} (now {})",
                pid,
                deadline,
                st.ticks
            );
        }

        // An unblock issued between the unlock and this call is not lost
        self.port.block_me(BlockReason::SLEEP);

        if self.lock_for_sleep()?.shut_down {
            log::debug!("sleep: pid {} resumed by shutdown", pid);
            return Err(SleepError::BadObjectState);
        }

        Ok(())
    }

    fn lock_for_sleep(&self) -> Result<MboxLockGuard<'_, P, SleepState>, SleepError> {
        self.state.lock().map_err(|e| {
            log::debug!("sleep: could not acquire the sleep lock: {:?}", e);
            SleepError::BadObjectState
        })
    }

    /// Advance the tick counter by one and resume every due request.
    pub(crate) fn tick(&self) -> Result<(), MboxError> {
        let mut st = self.state.lock()?;
        st.ticks += 1;
        let now = st.ticks;

        while let Some(req) = st.queue.pop_due(now) {
            log::trace!(
                "tick {}: waking pid {} (deadline {})",
                now,
                req.pid,
                req.deadline
            );
            if let Err(e) = self.port.unblock_proc(req.pid) {
                log::error!("tick {}: could not wake pid {}: {:?}", now, req.pid, e);
            }
        }

        Ok(())
    }

    /// Stop accepting requests and resume every pending one. The resumed
    /// callers fail with [`SleepError::BadObjectState`].
    pub(crate) fn shut_down(&self) -> Result<(), MboxError> {
        let mut st = self.state.lock()?;
        st.shut_down = true;

        let mut count = 0;
        while let Some(req) = st.queue.pop_due(u64::MAX) {
            if let Err(e) = self.port.unblock_proc(req.pid) {
                log::error!("shutdown: could not wake pid {}: {:?}", req.pid, e);
            }
            count += 1;
        }
        log::debug!("sleep facility shut down, {} sleepers resumed", count);
        Ok(())
    }

    pub(crate) fn ticks(&self) -> Result<u64, MboxError> {
        Ok(self.state.lock()?.ticks)
    }

    pub(crate) fn sleeper_count(&self) -> Result<usize, MboxError> {
        Ok(self.state.lock()?.queue.len())
    }
}
