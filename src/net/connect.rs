use std::{
    net::SocketAddrV4,
    os::fd::BorrowedFd,
    time::{Duration, Instant},
};

use tracing::trace;

use crate::{
    error::{Result, SocketError},
    sys,
};

/// Progress of a [super::Connector::open] call.
///
/// A call walks `Idle -> Resolving -> Connecting -> [Polling ->] Connected`, or stops in
/// `Failed` at the first step that goes wrong. `Polling` is only entered by non-blocking stream
/// sockets whose connect could not complete immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectState {
    #[default]
    Idle,
    Resolving,
    Connecting(SocketAddrV4),
    Polling {
        deadline: Instant,
    },
    Connected,
    Failed(SocketError),
}

impl ConnectState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectState::Connected | ConnectState::Failed(_))
    }
}

/// A source of write readiness for an in-progress connect.
///
/// [PollReadiness] is the OS implementation, tests can substitute their own to drive the
/// polling step deterministically.
pub trait Readiness {
    /// Wait up to `timeout` for `fd` to become writable, `Ok(false)` meaning the timeout elapsed.
    fn wait_writable(&mut self, fd: BorrowedFd<'_>, timeout: Duration) -> Result<bool>;

    /// Fetch the error left on `fd` by the asynchronous connect, if any.
    fn take_error(&mut self, fd: BorrowedFd<'_>) -> Result<Option<SocketError>>;
}

/// [Readiness] backed by `poll(2)` and `SO_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollReadiness;

impl Readiness for PollReadiness {
    fn wait_writable(&mut self, fd: BorrowedFd<'_>, timeout: Duration) -> Result<bool> {
        sys::wait_writable(fd, timeout)
    }

    fn take_error(&mut self, fd: BorrowedFd<'_>) -> Result<Option<SocketError>> {
        sys::take_error(fd)
    }
}

/// Wait for an in-progress connect on `fd` to finish before `deadline`. Interrupted waits resume
/// with whatever time is left.
pub(super) fn poll_connect<R>(readiness: &mut R, fd: BorrowedFd<'_>, deadline: Instant) -> Result<()>
where
    R: Readiness + ?Sized,
{
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match readiness.wait_writable(fd, remaining) {
            Ok(true) => {
                return match readiness.take_error(fd)? {
                    None => Ok(()),
                    Some(err) => Err(err),
                }
            }
            Ok(false) => return Err(SocketError::Timedout),
            Err(SocketError::Interrupted) => {
                trace!(?remaining, "connect poll interrupted, resuming");
                continue;
            }
            Err(err) => return Err(err),
        }
    }
}
