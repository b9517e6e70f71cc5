use std::{
    net::SocketAddrV4,
    ops::{Deref, DerefMut},
    os::fd::{AsFd, BorrowedFd},
    time::Instant,
};

use tracing::{debug, trace};

use crate::{
    error::{Result, SocketError},
    sys,
};

use super::{
    addr,
    connect::{self, ConnectState, PollReadiness, Readiness},
    Socket, SocketType,
};

/// A [Connector] represents the active (client) side of a connection. Stream connectors perform
/// the TCP handshake in [Connector::open], datagram connectors only record the default
/// destination.
///
/// A [Connector] dereferences to its [Socket] for sending, receiving and configuration. They are
/// also produced by [super::Listener::accept], already connected.
///
/// # Examples
///
/// ```no_run
/// use simple_socket::net::{Connector, SocketType};
///
/// let mut client = Connector::new(SocketType::Stream);
/// client.open("127.0.0.1", 6789).expect("Failed to connect.");
///
/// client.send(b"Hello from client!").expect("Failed to send.");
/// let read = client.receive(1024).expect("Failed to receive.");
/// println!("Server response: {}", String::from_utf8_lossy(&client.data()[..read]));
/// ```
#[derive(Debug, Clone)]
pub struct Connector {
    socket: Socket,
    state: ConnectState,
}

impl Connector {
    pub fn new(kind: SocketType) -> Connector {
        Connector::from(Socket::new(kind))
    }

    pub fn stream() -> Connector {
        Connector::new(SocketType::Stream)
    }

    pub fn datagram() -> Connector {
        Connector::new(SocketType::Datagram)
    }

    pub(super) fn accepted(socket: Socket) -> Connector {
        Connector {
            socket,
            state: ConnectState::Connected,
        }
    }

    /// Where the most recent [Connector::open] ended up.
    pub fn state(&self) -> ConnectState {
        self.state
    }

    /// Connect to `host:port`, see [Connector::open_with].
    pub fn open(&mut self, host: &str, port: u16) -> Result<()> {
        self.open_with(host, port, &mut PollReadiness)
    }

    /// Connect to `host:port`, resolving the host to an IPv4 address first.
    ///
    /// For a non-blocking stream socket whose connect is still in progress, `readiness` is used
    /// to wait for completion for at most the configured connect timeout, elapsing reports
    /// [SocketError::Timedout]. On success the local and peer addresses are recorded on the
    /// handle and the whole attempt is captured by the handle's timer.
    ///
    /// Invalid arguments and resolution failures leave the handle untouched. A failure of the
    /// connect itself, a timeout included, closes the descriptor since it is left in an
    /// unusable half connected state, the failure is still reported as the result. Opening a
    /// stream that is already connected fails with [SocketError::AlreadyConnected] and leaves
    /// the existing connection in place.
    pub fn open_with<R>(&mut self, host: &str, port: u16, readiness: &mut R) -> Result<()>
    where
        R: Readiness + ?Sized,
    {
        self.socket.begin();
        self.state = ConnectState::Idle;

        let result = self.drive(host, port, readiness);
        self.transition(match result {
            Ok(()) | Err(SocketError::AlreadyConnected) => ConnectState::Connected,
            Err(err) => ConnectState::Failed(err),
        });

        self.socket.record(result)
    }

    fn drive<R>(&mut self, host: &str, port: u16, readiness: &mut R) -> Result<()>
    where
        R: Readiness + ?Sized,
    {
        let fd = self.socket.valid_fd()?;
        if host.is_empty() {
            return Err(SocketError::InvalidAddress);
        }
        if port == 0 {
            return Err(SocketError::InvalidPort);
        }

        self.transition(ConnectState::Resolving);
        let remote = addr::resolve(host, port)?;
        self.transition(ConnectState::Connecting(remote));

        self.socket.timer.start();
        let result = match self.socket.kind {
            SocketType::Stream => self.connect_stream(fd.as_fd(), remote, readiness),
            SocketType::Datagram => sys::connect(fd.as_fd(), remote),
        };

        match result {
            Ok(()) => {}
            Err(SocketError::AlreadyConnected) => {
                self.socket.timer.stop();
                return Err(SocketError::AlreadyConnected);
            }
            Err(err) => {
                self.socket.timer.stop();
                return self.socket.abort(err);
            }
        }

        self.socket.peer = sys::peer_addr(fd.as_fd()).ok().or(Some(remote));
        self.socket.local = sys::local_addr(fd.as_fd()).ok();
        self.socket.timer.stop();
        debug!(
            local = ?self.socket.local,
            peer = ?self.socket.peer,
            kind = ?self.socket.kind,
            "connected"
        );
        Ok(())
    }

    fn connect_stream<R>(
        &mut self,
        fd: BorrowedFd<'_>,
        remote: SocketAddrV4,
        readiness: &mut R,
    ) -> Result<()>
    where
        R: Readiness + ?Sized,
    {
        match sys::connect(fd, remote) {
            Ok(()) => Ok(()),
            Err(SocketError::Ewouldblock | SocketError::Einprogress)
                if self.socket.is_nonblocking() =>
            {
                let deadline = Instant::now() + self.socket.connect_timeout;
                self.transition(ConnectState::Polling { deadline });
                connect::poll_connect(readiness, fd, deadline)
            }
            Err(err) => Err(err),
        }
    }

    fn transition(&mut self, next: ConnectState) {
        trace!(from = ?self.state, to = ?next, "connect state");
        self.state = next;
    }

    /// Give up the connector role and return the underlying handle.
    pub fn into_socket(self) -> Socket {
        self.socket
    }
}

impl From<Socket> for Connector {
    fn from(socket: Socket) -> Self {
        Connector {
            socket,
            state: ConnectState::Idle,
        }
    }
}

impl Deref for Connector {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl DerefMut for Connector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}
