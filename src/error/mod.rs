//! The [self] module holds the canonical error vocabulary shared by every socket handle. Each
//! OS call made by the [crate::net] types reports its outcome through [SocketError], which is
//! produced from a raw platform error code by the translator in [translate].
//!
//! The translation tables for every supported platform are always compiled in, so a code
//! captured on one host can be classified as if it came from another.

mod statics;
mod translate;

use core::result;
use std::io;

use nix::errno::Errno;
use thiserror::Error;

pub use translate::{translate, Platform};

/// A helper type for wrapping a [result::Result] such that we can reduce noise in our signatures.
pub type Result<T> = result::Result<T, SocketError>;

/// The canonical, platform independent classification of a socket operation's outcome.
///
/// Every handle records the kind produced by its most recent operation, [SocketError::Success]
/// included, so callers that prefer inspecting state over matching on a [Result] can do so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SocketError {
    #[error("operation completed successfully")]
    Success,
    #[error("socket descriptor is invalid or closed")]
    InvalidSocket,
    #[error("address is missing, malformed or could not be resolved")]
    InvalidAddress,
    #[error("port must be non-zero")]
    InvalidPort,
    #[error("timeout microseconds must be below one second")]
    InvalidTimeout,
    #[error("connection refused by remote host")]
    ConnectionRefused,
    #[error("operation timed out")]
    Timedout,
    #[error("operation would block")]
    Ewouldblock,
    #[error("operation is in progress")]
    Einprogress,
    #[error("operation was interrupted")]
    Interrupted,
    #[error("operation is not supported by this socket type")]
    ProtocolError,
    #[error("address is already in use")]
    AddressInUse,
    #[error("socket is not connected")]
    NotConnected,
    #[error("connection reset by peer")]
    ConnectionReset,
    #[error("connection aborted")]
    ConnectionAborted,
    #[error("socket is already connected")]
    AlreadyConnected,
    #[error("unclassified socket error")]
    SocketError,
}

impl SocketError {
    /// Whether the caller may retry or keep polling after receiving this kind.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SocketError::Timedout
                | SocketError::Ewouldblock
                | SocketError::Einprogress
                | SocketError::Interrupted
        )
    }

    pub fn is_success(&self) -> bool {
        *self == SocketError::Success
    }
}

impl From<Errno> for SocketError {
    fn from(value: Errno) -> Self {
        translate(value as i32, Platform::current())
    }
}

impl From<i32> for SocketError {
    fn from(value: i32) -> Self {
        translate(value, Platform::current())
    }
}

impl From<SocketError> for io::Error {
    fn from(value: SocketError) -> Self {
        let kind = match value {
            SocketError::Success => return io::Error::new(io::ErrorKind::Other, value),
            SocketError::InvalidSocket | SocketError::ProtocolError => io::ErrorKind::Unsupported,
            SocketError::InvalidAddress | SocketError::InvalidPort | SocketError::InvalidTimeout => {
                io::ErrorKind::InvalidInput
            }
            SocketError::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            SocketError::Timedout => io::ErrorKind::TimedOut,
            SocketError::Ewouldblock | SocketError::Einprogress => io::ErrorKind::WouldBlock,
            SocketError::Interrupted => io::ErrorKind::Interrupted,
            SocketError::AddressInUse => io::ErrorKind::AddrInUse,
            SocketError::NotConnected => io::ErrorKind::NotConnected,
            SocketError::ConnectionReset => io::ErrorKind::ConnectionReset,
            SocketError::ConnectionAborted => io::ErrorKind::ConnectionAborted,
            SocketError::AlreadyConnected => io::ErrorKind::Other,
            SocketError::SocketError => io::ErrorKind::Other,
        };
        io::Error::new(kind, value)
    }
}
