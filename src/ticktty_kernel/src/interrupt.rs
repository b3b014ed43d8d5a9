//! Decoding of terminal interrupts
use ticktty_core::device::{DeviceState, TermStatus};

/// The events reported by one terminal interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TermInterrupt {
    /// A byte was received.
    Receive(u8),
    /// The device can accept the next byte to transmit.
    TransmitReady,
    /// Both of the above.
    Both(u8),
}

impl TermInterrupt {
    /// Decode a status word. Returns `None` if it reports neither event.
    pub(crate) fn decode(status: TermStatus) -> Option<Self> {
        let received = status.recv() == DeviceState::Busy;
        let ready = status.xmit() == DeviceState::Ready;
        match (received, ready) {
            (true, true) => Some(Self::Both(status.char())),
            (true, false) => Some(Self::Receive(status.char())),
            (false, true) => Some(Self::TransmitReady),
            (false, false) => None,
        }
    }

    /// The received byte, if any.
    #[inline]
    pub(crate) fn received(self) -> Option<u8> {
        match self {
            Self::Receive(ch) | Self::Both(ch) => Some(ch),
            Self::TransmitReady => None,
        }
    }

    #[inline]
    pub(crate) fn transmit_ready(self) -> bool {
        matches!(self, Self::TransmitReady | Self::Both(_))
    }
}
