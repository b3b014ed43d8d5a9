//! System-call numbers and argument blocks
use crate::error::ResultCode;

/// Identifies a system call installed by the driver layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum SyscallNum {
    Sleep = 0,
    TermRead,
    TermWrite,
    DiskRead,
    DiskWrite,
    DiskSize,
}

/// The number of system calls defined by [`SyscallNum`].
pub const NUM_SYSCALLS: usize = 6;

impl SyscallNum {
    /// All system calls, in the ascending order of their numbers.
    pub const ALL: [Self; NUM_SYSCALLS] = [
        Self::Sleep,
        Self::TermRead,
        Self::TermWrite,
        Self::DiskRead,
        Self::DiskWrite,
        Self::DiskSize,
    ];

    /// Get the index of the system call in a dispatch table.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The argument block of a system call.
///
/// Each variant carries the input fields supplied by the caller and the
/// output fields written by the handler. Output fields start out zeroed
/// ([`ResultCode::Success`] for `result`); the constructors take care of this.
#[derive(Debug, PartialEq, Eq)]
pub enum Sysargs<'a> {
    Sleep {
        seconds: i32,
        result: ResultCode,
    },
    TermRead {
        buffer: Option<&'a mut [u8]>,
        buffer_size: i32,
        unit: i32,
        chars_read: i32,
        result: ResultCode,
    },
    TermWrite {
        buffer: Option<&'a [u8]>,
        buffer_size: i32,
        unit: i32,
        chars_written: i32,
        result: ResultCode,
    },
    DiskRead {
        buffer: Option<&'a mut [u8]>,
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
        status: i32,
        result: ResultCode,
    },
    DiskWrite {
        buffer: Option<&'a [u8]>,
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
        status: i32,
        result: ResultCode,
    },
    DiskSize {
        unit: i32,
        sector: i32,
        track: i32,
        disk: i32,
        result: ResultCode,
    },
}

impl<'a> Sysargs<'a> {
    pub fn sleep(seconds: i32) -> Self {
        Self::Sleep {
            seconds,
            result: ResultCode::Success,
        }
    }

    pub fn term_read(buffer: Option<&'a mut [u8]>, buffer_size: i32, unit: i32) -> Self {
        Self::TermRead {
            buffer,
            buffer_size,
            unit,
            chars_read: 0,
            result: ResultCode::Success,
        }
    }

    pub fn term_write(buffer: Option<&'a [u8]>, buffer_size: i32, unit: i32) -> Self {
        Self::TermWrite {
            buffer,
            buffer_size,
            unit,
            chars_written: 0,
            result: ResultCode::Success,
        }
    }

    pub fn disk_read(
        buffer: Option<&'a mut [u8]>,
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
    ) -> Self {
        Self::DiskRead {
            buffer,
            unit,
            track,
            first,
            sectors,
            status: 0,
            result: ResultCode::Success,
        }
    }

    pub fn disk_write(
        buffer: Option<&'a [u8]>,
        unit: i32,
        track: i32,
        first: i32,
        sectors: i32,
    ) -> Self {
        Self::DiskWrite {
            buffer,
            unit,
            track,
            first,
            sectors,
            status: 0,
            result: ResultCode::Success,
        }
    }

    pub fn disk_size(unit: i32) -> Self {
        Self::DiskSize {
            unit,
            sector: 0,
            track: 0,
            disk: 0,
            result: ResultCode::Success,
        }
    }

    /// Get the system call this argument block is meant for.
    pub fn number(&self) -> SyscallNum {
        match self {
            Self::Sleep { .. } => SyscallNum::Sleep,
            Self::TermRead { .. } => SyscallNum::TermRead,
            Self::TermWrite { .. } => SyscallNum::TermWrite,
            Self::DiskRead { .. } => SyscallNum::DiskRead,
            Self::DiskWrite { .. } => SyscallNum::DiskWrite,
            Self::DiskSize { .. } => SyscallNum::DiskSize,
        }
    }

    /// Get the result code written by the handler.
    pub fn result(&self) -> ResultCode {
        match self {
            Self::Sleep { result, .. }
            | Self::TermRead { result, .. }
            | Self::TermWrite { result, .. }
            | Self::DiskRead { result, .. }
            | Self::DiskWrite { result, .. }
            | Self::DiskSize { result, .. } => *result,
        }
    }

    /// Overwrite the result code.
    pub fn set_result(&mut self, code: ResultCode) {
        match self {
            Self::Sleep { result, .. }
            | Self::TermRead { result, .. }
            | Self::TermWrite { result, .. }
            | Self::DiskRead { result, .. }
            | Self::DiskWrite { result, .. }
            | Self::DiskSize { result, .. } => *result = code,
        }
    }
}
