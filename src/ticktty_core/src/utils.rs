//! Utility
mod init;
pub use self::init::*;
