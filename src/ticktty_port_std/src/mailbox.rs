//! Mailboxes
use parking_lot::{Condvar, Mutex};
use spin::Mutex as SpinMutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use ticktty_core::{error::MboxError, port::MboxId};

/// The maximum number of mailboxes that can exist at the same time.
pub const MAX_MAILBOXES: usize = 2000;

#[derive(Debug, Default)]
struct MboxState {
    queue: VecDeque<Vec<u8>>,
    /// The number of receivers blocked in `recv`.
    waiting_receivers: usize,
    released: bool,
}

#[derive(Debug)]
struct Mailbox {
    slots: usize,
    slot_size: usize,
    st: Mutex<MboxState>,
    cond: Condvar,
}

impl Mailbox {
    /// A rendezvous mailbox accepts as many messages as there are waiting
    /// receivers.
    fn can_accept(&self, st: &MboxState) -> bool {
        if self.slots == 0 {
            st.queue.len() < st.waiting_receivers
        } else {
            st.queue.len() < self.slots
        }
    }

    fn check_size(&self, msg: &[u8]) -> Result<(), MboxError> {
        if msg.len() > self.slot_size {
            Err(MboxError::MessageTooLarge)
        } else {
            Ok(())
        }
    }

    fn send(&self, msg: &[u8], block: bool) -> Result<(), MboxError> {
        self.check_size(msg)?;
        let mut st = self.st.lock();
        loop {
            if st.released {
                return Err(MboxError::Released);
            }
            if self.can_accept(&st) {
                st.queue.push_back(msg.to_vec());
                self.cond.notify_all();
                return Ok(());
            }
            if !block {
                return Err(MboxError::WouldBlock);
            }
            self.cond.wait(&mut st);
        }
    }

    fn recv(&self, buf: &mut [u8], block: bool) -> Result<usize, MboxError> {
        let mut st = self.st.lock();
        if block {
            st.waiting_receivers += 1;
            // Let rendezvous senders know there's a receiver
            self.cond.notify_all();
        }

        let result = loop {
            if let Some(msg) = st.queue.front() {
                if msg.len() > buf.len() {
                    break Err(MboxError::BufferTooSmall);
                }
                let msg = st.queue.pop_front().unwrap_or_default();
                buf[..msg.len()].copy_from_slice(&msg);
                self.cond.notify_all();
                break Ok(msg.len());
            }
            if st.released {
                break Err(MboxError::Released);
            }
            if !block {
                break Err(MboxError::WouldBlock);
            }
            self.cond.wait(&mut st);
        };

        if block {
            st.waiting_receivers -= 1;
        }
        result
    }

    fn release(&self) {
        let mut st = self.st.lock();
        st.released = true;
        st.queue.clear();
        self.cond.notify_all();
    }
}

/// The table of live mailboxes.
#[derive(Debug)]
pub(crate) struct MailboxTable {
    boxes: SpinMutex<HashMap<MboxId, Arc<Mailbox>>>,
    next_id: SpinMutex<MboxId>,
}

impl MailboxTable {
    pub(crate) fn new() -> Self {
        Self {
            boxes: SpinMutex::new(HashMap::new()),
            next_id: SpinMutex::new(0),
        }
    }

    fn get(&self, id: MboxId) -> Result<Arc<Mailbox>, MboxError> {
        self.boxes.lock().get(&id).cloned().ok_or(MboxError::BadId)
    }

    pub(crate) fn create(&self, slots: usize, slot_size: usize) -> Result<MboxId, MboxError> {
        let mut boxes = self.boxes.lock();
        if boxes.len() >= MAX_MAILBOXES {
            log::warn!("mailbox table is full");
            return Err(MboxError::BadParam);
        }

        // IDs are never reused
        let id = {
            let mut next_id = self.next_id.lock();
            let id = *next_id;
            *next_id = next_id.checked_add(1).ok_or(MboxError::BadParam)?;
            id
        };

        boxes.insert(
            id,
            Arc::new(Mailbox {
                slots,
                slot_size,
                st: Mutex::new(MboxState::default()),
                cond: Condvar::new(),
            }),
        );
        log::trace!("mbox_create({}, {}) = {}", slots, slot_size, id);
        Ok(id)
    }

    pub(crate) fn send(&self, id: MboxId, msg: &[u8], block: bool) -> Result<(), MboxError> {
        self.get(id)?.send(msg, block)
    }

    pub(crate) fn recv(&self, id: MboxId, buf: &mut [u8], block: bool) -> Result<usize, MboxError> {
        self.get(id)?.recv(buf, block)
    }

    pub(crate) fn release(&self, id: MboxId) -> Result<(), MboxError> {
        let mbox = self.boxes.lock().remove(&id).ok_or(MboxError::BadId)?;
        log::trace!("mbox_release({})", id);
        mbox.release();
        Ok(())
    }

    /// Release every mailbox.
    pub(crate) fn release_all(&self) {
        let boxes: Vec<_> = self.boxes.lock().drain().map(|(_, mbox)| mbox).collect();
        log::debug!("releasing {} mailboxes", boxes.len());
        for mbox in boxes {
            mbox.release();
        }
    }
}
