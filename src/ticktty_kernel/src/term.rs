//! Terminal units
//!
//! Each unit is served by one driver task ([`TermUnit::run`]) that owns the
//! unit's line buffer. The driver task communicates with callers only through
//! mailboxes:
//!
//!  - `lines` is a bounded queue of completed lines, filled by the driver task
//!    and drained by [`TermUnit::read`].
//!  - `ready` is a rendezvous channel. The driver task signals it on every
//!    transmit-ready interrupt, and the signal is dropped if no writer is
//!    waiting for it.
//!  - `write_lock` serializes writers so that concurrent writes are never
//!    interleaved.
use alloc::{sync::Arc, vec, vec::Vec};
use ticktty_core::{
    device::{DeviceClass, TermCtrl, TermStatus},
    error::{DeviceError, MboxError, TermReadError, TermWriteError},
    port::Port,
};

use crate::{
    cfg::DriverConfig,
    error::PartialWrite,
    interrupt::TermInterrupt,
    klock::{Mailbox, MboxLock},
};

/// The line being assembled by a driver task.
#[derive(Debug)]
pub(crate) struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a byte. Returns `true` if the line is complete, i.e., `ch` is a
    /// newline or the buffer has reached its capacity.
    pub(crate) fn push(&mut self, ch: u8) -> bool {
        self.bytes.push(ch);
        ch == b'\n' || self.bytes.len() >= self.capacity
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// A terminal unit.
pub(crate) struct TermUnit<P: Port> {
    port: Arc<P>,
    unit: usize,
    max_line: usize,
    lines: Mailbox<P>,
    ready: Mailbox<P>,
    write_lock: MboxLock<P, ()>,
}

impl<P: Port> TermUnit<P> {
    pub(crate) fn new(port: &Arc<P>, unit: usize, cfg: &DriverConfig) -> Result<Self, MboxError> {
        Ok(Self {
            port: Arc::clone(port),
            unit,
            max_line: cfg.max_line,
            lines: Mailbox::new(port, cfg.line_queue_slots, cfg.max_line)?,
            ready: Mailbox::new(port, 0, 0)?,
            write_lock: MboxLock::new(port, ())?,
        })
    }

    /// Enable the receive and transmit interrupts of the unit.
    pub(crate) fn arm(&self) -> Result<(), DeviceError> {
        self.port.device_output(
            DeviceClass::Terminal,
            self.unit,
            (TermCtrl::RECV_INT | TermCtrl::XMIT_INT).bits(),
        )
    }

    /// The body of the unit's driver task. Returns when the device reports
    /// shutdown.
    pub(crate) fn run(&self) {
        log::info!("terminal driver {} started", self.unit);
        let mut line = LineBuffer::new(self.max_line);

        loop {
            let status = match self.port.wait_device(DeviceClass::Terminal, self.unit) {
                Ok(status) => TermStatus(status),
                Err(DeviceError::Shutdown) => {
                    log::info!("terminal driver {} stopped", self.unit);
                    return;
                }
                Err(e) => {
                    log::error!("terminal driver {}: wait failed: {:?}", self.unit, e);
                    return;
                }
            };

            self.handle_interrupt(&mut line, status);
        }
    }

    pub(crate) fn handle_interrupt(&self, line: &mut LineBuffer, status: TermStatus) {
        let Some(int) = TermInterrupt::decode(status) else {
            log::trace!("terminal {}: spurious interrupt {:#x}", self.unit, status.0);
            return;
        };

        if let Some(ch) = int.received() {
            self.on_receive(line, ch);
        }
        if int.transmit_ready() {
            self.on_transmit_ready();
        }
    }

    fn on_receive(&self, line: &mut LineBuffer, ch: u8) {
        if !line.push(ch) {
            return;
        }

        match self.lines.cond_send(line.as_slice()) {
            Ok(()) => {
                log::trace!("terminal {}: line of {} bytes", self.unit, line.as_slice().len());
            }
            Err(MboxError::WouldBlock) => {
                log::warn!(
                    "terminal {}: line queue is full, dropping {} bytes",
                    self.unit,
                    line.as_slice().len()
                );
            }
            Err(e) => {
                log::error!("terminal {}: could not queue a line: {:?}", self.unit, e);
            }
        }

        line.clear();
    }

    fn on_transmit_ready(&self) {
        match self.ready.cond_send(&[]) {
            Ok(()) | Err(MboxError::WouldBlock) => {}
            Err(e) => {
                log::error!("terminal {}: could not signal a writer: {:?}", self.unit, e);
            }
        }
    }

    /// Receive the next line into `buffer`, copying at most `limit` bytes.
    pub(crate) fn read(&self, buffer: &mut [u8], limit: usize) -> Result<usize, TermReadError> {
        let mut line = vec![0u8; self.max_line];
        let len = self.lines.recv(&mut line).map_err(|e| {
            log::debug!("terminal {}: read failed: {:?}", self.unit, e);
            TermReadError::BadObjectState
        })?;

        let limit = limit.min(buffer.len());
        let count = len.min(limit);
        buffer[..count].copy_from_slice(&line[..count]);
        if count < limit {
            buffer[count] = 0;
        }

        Ok(count)
    }

    /// Transmit every byte of `data` in order.
    pub(crate) fn write(&self, data: &[u8]) -> Result<usize, PartialWrite> {
        let _guard = self.write_lock.lock().map_err(|e| {
            log::debug!("terminal {}: write lock failed: {:?}", self.unit, e);
            PartialWrite::new(TermWriteError::BadObjectState, 0)
        })?;

        for (written, &ch) in data.iter().enumerate() {
            self.ready.recv(&mut []).map_err(|e| {
                log::debug!("terminal {}: ready wait failed: {:?}", self.unit, e);
                PartialWrite::new(TermWriteError::BadObjectState, written)
            })?;

            let ctrl =
                (TermCtrl::XMIT_CHAR | TermCtrl::RECV_INT | TermCtrl::XMIT_INT).with_char(ch);
            self.port
                .device_output(DeviceClass::Terminal, self.unit, ctrl)
                .map_err(|e| {
                    log::debug!("terminal {}: output rejected: {:?}", self.unit, e);
                    PartialWrite::new(TermWriteError::Io, written)
                })?;
        }

        Ok(data.len())
    }
}
