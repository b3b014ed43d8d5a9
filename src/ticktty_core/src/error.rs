//! Result codes and error types
use core::fmt;

/// The macro to define [`ResultCode`].
macro_rules! define_result_code {
    (
        $( #[$meta:meta] )*
        pub enum ResultCode {
            $(
                $( #[$vmeta:meta] )*
                $vname:ident = $vd:expr
            ),* $(,)*
        }
    ) => {
        $( #[$meta] )*
        pub enum ResultCode {
            $(
                $( #[$vmeta] )*
                $vname = $vd
            ),*
        }

        impl ResultCode {
            /// Get the short name of the result code.
            ///
            /// # Examples
            ///
            /// ```
            /// use ticktty_core::error::ResultCode;
            /// assert_eq!(ResultCode::BadParam.as_str(), "BadParam");
            /// ```
            pub fn as_str(self) -> &'static str {
                match self {
                    $(
                        Self::$vname => stringify!($vname),
                    )*
                }
            }

            /// Convert a raw result code back to `ResultCode`. Returns `None`
            /// if `raw` does not represent any known result code.
            pub fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    $(
                        x if x == Self::$vname as i32 => Some(Self::$vname),
                    )*
                    _ => None,
                }
            }

            fn fmt(self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl fmt::Debug for ResultCode {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                (*self).fmt(f)
            }
        }
    };
}

define_result_code! {
    /// All result codes (including success) that a service call can report
    /// through its argument block.
    ///
    /// Failure codes are negative, so a caller only interested in
    /// success/failure can test the sign of the raw value.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[repr(i8)]
    pub enum ResultCode {
        /// The operation was successful. No additional information is available.
        Success = 0,
        /// A parameter is invalid: a negative sleep duration, an out-of-range
        /// terminal unit, or a missing or empty buffer.
        BadParam = -1,
        /// The device rejected an output operation.
        Io = -2,
        /// An operation couldn't be enqueued because there are too many of
        /// such things that already have been enqueued.
        QueueOverflow = -3,
        /// A target object is in a state that disallows the operation, e.g.,
        /// the calling context already has a pending request, or the driver
        /// facility has been shut down.
        BadObjectState = -4,
    }
}

impl ResultCode {
    /// Get a flag indicating whether the code represents a failure.
    ///
    /// Failure codes have negative values.
    #[inline]
    pub fn is_err(self) -> bool {
        (self as i8) < 0
    }

    /// Get a flag indicating whether the code represents a success.
    ///
    /// Success codes have non-negative values.
    #[inline]
    pub fn is_ok(self) -> bool {
        !self.is_err()
    }

    /// Get the raw value written to a system-call argument block.
    #[inline]
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

macro_rules! define_error {
    (
        mod $mod_name:ident {}
        $( #[$meta:meta] )*
        $vis:vis enum $name:ident {
            $(
                $( #[$vmeta:meta] )*
                $vname:ident
            ),* $(,)*
        }
    ) => {
        $( #[$meta] )*
        ///
        /// See [`ResultCode`] for all result codes and generic descriptions.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(i8)]
        $vis enum $name {
            $(
                $( #[$vmeta] )*
                // Use the same discriminants as `ResultCode` for cost-free
                // conversion
                $vname = ResultCode::$vname as i8
            ),*
        }

        impl fmt::Debug for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                ResultCode::from(*self).fmt(f)
            }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                ResultCode::from(*self).fmt(f)
            }
        }

        impl From<Result<(), $name>> for ResultCode {
            #[inline]
            fn from(x: Result<(), $name>) -> Self {
                match x {
                    Ok(()) => Self::Success,
                    Err(e) => Self::from(e),
                }
            }
        }

        impl From<$name> for ResultCode {
            #[inline]
            fn from(x: $name) -> Self {
                match x {
                    $(
                        $name::$vname => Self::$vname,
                    )*
                }
            }
        }

        #[cfg(test)]
        mod $mod_name {
            use super::*;

            #[test]
            fn to_result_code() {
                $(
                    assert_eq!(
                        ResultCode::$vname,
                        ResultCode::from($name::$vname),
                    );
                    assert_eq!(
                        ResultCode::$vname as i8,
                        $name::$vname as i8,
                    );
                )*
            }

            #[test]
            fn result_to_result_code() {
                $(
                    assert_eq!(
                        ResultCode::$vname,
                        ResultCode::from(Err($name::$vname)),
                    );
                )*
                assert_eq!(
                    ResultCode::Success,
                    ResultCode::from(Result::<(), $name>::Ok(())),
                );
            }
        }
    };
}

define_error! {
    mod sleep_error {}
    /// Error type for the sleep service call.
    pub enum SleepError {
        /// The requested duration is negative.
        BadParam,
        /// The wait queue already holds as many requests as there can be
        /// contexts.
        QueueOverflow,
        /// The calling context already has a pending sleep request, or the
        /// sleep facility is no longer operational.
        BadObjectState,
    }
}

define_error! {
    mod term_read_error {}
    /// Error type for the terminal read service call.
    pub enum TermReadError {
        /// The unit number is out of range, or the buffer is missing or empty.
        BadParam,
        /// The terminal facility is no longer operational.
        BadObjectState,
    }
}

define_error! {
    mod term_write_error {}
    /// Error type for the terminal write service call.
    pub enum TermWriteError {
        /// The unit number is out of range, or the buffer is missing or empty.
        BadParam,
        /// The terminal device rejected an output operation.
        Io,
        /// The terminal facility is no longer operational.
        BadObjectState,
    }
}

/// Error type for [`PortMailbox`]'s methods.
///
/// [`PortMailbox`]: crate::port::PortMailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MboxError {
    /// The mailbox ID does not refer to a live mailbox.
    BadId,
    /// The mailbox table is exhausted, or the requested shape is invalid.
    BadParam,
    /// The message is longer than the mailbox's slot size.
    MessageTooLarge,
    /// The receive buffer is shorter than the message.
    BufferTooSmall,
    /// A conditional operation could not complete without blocking.
    WouldBlock,
    /// The mailbox was released while the operation was in progress.
    Released,
}

/// Error type for [`PortDevice`]'s methods.
///
/// [`PortDevice`]: crate::port::PortDevice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceError {
    /// The device unit does not exist.
    BadUnit,
    /// The device rejected the control word.
    Rejected,
    /// The host kernel is shutting down. No more interrupts will be delivered.
    Shutdown,
}

/// Error type for [`PortThreading::unblock_proc`].
///
/// [`PortThreading::unblock_proc`]: crate::port::PortThreading::unblock_proc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnblockError {
    /// The process ID does not refer to a live process.
    BadPid,
}

/// Error type for [`PortThreading::spork`].
///
/// [`PortThreading::spork`]: crate::port::PortThreading::spork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnError {
    /// The host kernel couldn't create another process.
    OutOfResources,
}
