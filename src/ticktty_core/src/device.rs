//! Device classes and the terminal status/control word encodings
use bitflags::bitflags;

/// The number of clock device units.
pub const CLOCK_UNITS: usize = 1;

/// The number of terminal device units on a standard host.
pub const TERM_UNITS: usize = 4;

/// The number of disk device units on a standard host.
pub const DISK_UNITS: usize = 2;

/// A class of devices that can be waited on with
/// [`PortDevice::wait_device`].
///
/// [`PortDevice::wait_device`]: crate::port::PortDevice::wait_device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Clock,
    Disk,
    Terminal,
}

/// The state of one half (receive or transmit) of a device, as reported in a
/// status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    /// For the receive half: no character is available. For the transmit
    /// half: the device can accept the next character.
    Ready = 0,
    /// For the receive half: a character has been received. For the transmit
    /// half: the device is still transmitting.
    Busy = 1,
    /// The device reported an error.
    Error = 2,
}

impl DeviceState {
    /// Decode a two-bit state field. The fourth encoding is reserved and
    /// reported as [`Self::Error`].
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Ready,
            1 => Self::Busy,
            _ => Self::Error,
        }
    }
}

/// A terminal status word as returned by
/// [`PortDevice::wait_device`]`(`[`DeviceClass::Terminal`]`, _)`.
///
/// ```text
///  31               16 15       8 7     4 3    2 1    0
/// ┌───────────────────┬──────────┬───────┬──────┬──────┐
/// │     (unused)      │   char   │   -   │ xmit │ recv │
/// └───────────────────┴──────────┴───────┴──────┴──────┘
/// ```
///
/// [`PortDevice::wait_device`]: crate::port::PortDevice::wait_device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermStatus(pub u32);

impl TermStatus {
    /// Construct a status word.
    #[inline]
    pub const fn new(recv: DeviceState, xmit: DeviceState, ch: u8) -> Self {
        Self((recv as u32) | ((xmit as u32) << 2) | ((ch as u32) << 8))
    }

    /// The state of the receive half.
    #[inline]
    pub const fn recv(self) -> DeviceState {
        DeviceState::from_bits(self.0)
    }

    /// The state of the transmit half.
    #[inline]
    pub const fn xmit(self) -> DeviceState {
        DeviceState::from_bits(self.0 >> 2)
    }

    /// The received character. Only meaningful if `self.recv()` is
    /// [`DeviceState::Busy`].
    #[inline]
    pub const fn char(self) -> u8 {
        (self.0 >> 8) as u8
    }
}

bitflags! {
    /// Terminal control word flags passed to [`PortDevice::device_output`].
    /// The character to transmit occupies bits 8..16 (see
    /// [`TermCtrl::with_char`]).
    ///
    /// [`PortDevice::device_output`]: crate::port::PortDevice::device_output
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TermCtrl: u32 {
        /// Transmit the character stored in bits 8..16.
        const XMIT_CHAR = 1 << 0;
        /// Enable the receive interrupt.
        const RECV_INT = 1 << 1;
        /// Enable the transmit interrupt.
        const XMIT_INT = 1 << 2;
    }
}

impl TermCtrl {
    /// Encode `self` and the character `ch` into a raw control word.
    #[inline]
    pub const fn with_char(self, ch: u8) -> u32 {
        self.bits() | ((ch as u32) << 8)
    }

    /// Decode a raw control word into the flags and the character.
    #[inline]
    pub const fn decode(word: u32) -> (Self, u8) {
        (Self::from_bits_truncate(word), (word >> 8) as u8)
    }
}
