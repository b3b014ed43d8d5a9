//! Simulated devices
//!
//! Each device unit has an [`InterruptLine`] through which status words are
//! delivered to the driver task blocked in `wait_device`. Raising an
//! interrupt returns only after the driver task has finished handling it and
//! come back for the next one, so a test that raises interrupts one by one
//! observes the effect of each before raising the next.
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use ticktty_core::{
    device::{DeviceState, TermCtrl, TermStatus},
    error::DeviceError,
};

#[derive(Debug, Default)]
struct LineState {
    pending: VecDeque<u32>,
    /// The number of interrupts raised so far.
    raised: u64,
    /// The number of interrupts whose handling has completed.
    completed: u64,
    /// A driver task has taken an interrupt and hasn't come back yet.
    in_service: bool,
    shutdown: bool,
}

/// The interrupt line of one device unit.
#[derive(Debug, Default)]
pub struct InterruptLine {
    st: Mutex<LineState>,
    cond: Condvar,
}

impl InterruptLine {
    /// Deliver `status` and wait until the driver task is done with it.
    /// Returns `false` if the line has been shut down.
    pub fn raise(&self, status: u32) -> bool {
        let mut st = self.st.lock();
        if st.shutdown {
            return false;
        }
        st.pending.push_back(status);
        st.raised += 1;
        let seq = st.raised;
        self.cond.notify_all();

        while st.completed < seq {
            if st.shutdown {
                return false;
            }
            self.cond.wait(&mut st);
        }
        true
    }

    /// Block until an interrupt is raised. Called by the driver task.
    pub(crate) fn wait(&self) -> Result<u32, DeviceError> {
        let mut st = self.st.lock();
        if st.in_service {
            st.in_service = false;
            st.completed += 1;
            self.cond.notify_all();
        }

        loop {
            if st.shutdown {
                return Err(DeviceError::Shutdown);
            }
            if let Some(status) = st.pending.pop_front() {
                st.in_service = true;
                return Ok(status);
            }
            self.cond.wait(&mut st);
        }
    }

    pub(crate) fn shutdown(&self) {
        let mut st = self.st.lock();
        st.shutdown = true;
        self.cond.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.st.lock().shutdown
    }
}

/// The clock device.
#[derive(Debug, Default)]
pub struct SimClock {
    line: InterruptLine,
}

impl SimClock {
    /// Generate one clock interrupt and wait until the clock driver has
    /// processed it. Returns `false` after shutdown.
    pub fn tick(&self) -> bool {
        log::trace!("clock tick");
        self.line.raise(0)
    }

    pub(crate) fn line(&self) -> &InterruptLine {
        &self.line
    }
}

#[derive(Debug, Default)]
struct TermState {
    input: VecDeque<u8>,
    output: Vec<u8>,
    recv_int: bool,
    xmit_int: bool,
    loopback: bool,
    /// The number of further bytes the device accepts before rejecting
    /// output.
    fail_after: Option<usize>,
}

/// A terminal device.
#[derive(Debug)]
pub struct SimTerminal {
    unit: usize,
    line: InterruptLine,
    st: Mutex<TermState>,
}

impl SimTerminal {
    pub(crate) fn new(unit: usize, loopback: bool) -> Self {
        Self {
            unit,
            line: InterruptLine::default(),
            st: Mutex::new(TermState {
                loopback,
                ..TermState::default()
            }),
        }
    }

    pub(crate) fn line(&self) -> &InterruptLine {
        &self.line
    }

    /// Handle a control word.
    pub(crate) fn output(&self, control: u32) -> Result<(), DeviceError> {
        let (flags, ch) = TermCtrl::decode(control);
        let mut st = self.st.lock();

        if flags.contains(TermCtrl::XMIT_CHAR) {
            match st.fail_after {
                Some(0) => {
                    log::debug!("terminal {}: rejecting {:?}", self.unit, ch as char);
                    return Err(DeviceError::Rejected);
                }
                Some(ref mut n) => *n -= 1,
                None => {}
            }
            st.output.push(ch);
            if st.loopback {
                st.input.push_back(ch);
            }
        }

        st.recv_int = flags.contains(TermCtrl::RECV_INT);
        st.xmit_int = flags.contains(TermCtrl::XMIT_INT);
        Ok(())
    }

    /// Generate one interrupt reporting the device's current state and wait
    /// until the terminal driver has processed it.
    ///
    /// A pending input byte is reported as received if the receive interrupt
    /// is enabled. The device reports itself ready to transmit if the transmit
    /// interrupt is enabled. Returns `false` (without raising an interrupt) if
    /// there is nothing to report.
    pub fn step(&self) -> bool {
        let status = {
            let mut st = self.st.lock();
            let received = if st.recv_int { st.input.pop_front() } else { None };
            let recv = match received {
                Some(_) => DeviceState::Busy,
                None => DeviceState::Ready,
            };
            let xmit = if st.xmit_int {
                DeviceState::Ready
            } else {
                DeviceState::Busy
            };
            if received.is_none() && !st.xmit_int {
                return false;
            }
            TermStatus::new(recv, xmit, received.unwrap_or(0))
        };

        self.line.raise(status.0)
    }

    /// Step the device until every pending input byte has been delivered.
    pub fn drain_input(&self) {
        while self.pending_input() > 0 && !self.line.is_shutdown() {
            if !self.step() {
                break;
            }
        }
    }

    /// Queue bytes as if they were typed on the terminal.
    pub fn type_input(&self, bytes: &[u8]) {
        self.st.lock().input.extend(bytes.iter().copied());
    }

    pub fn pending_input(&self) -> usize {
        self.st.lock().input.len()
    }

    /// Get every byte transmitted so far.
    pub fn transmitted(&self) -> Vec<u8> {
        self.st.lock().output.clone()
    }

    pub fn set_loopback(&self, loopback: bool) {
        self.st.lock().loopback = loopback;
    }

    /// Make the device reject output once `count` more bytes have been
    /// transmitted.
    pub fn fail_output_after(&self, count: usize) {
        self.st.lock().fail_after = Some(count);
    }
}
