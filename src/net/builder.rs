use std::{fmt, time::Duration};

use crate::error::Result;

use super::{socket::Timeout, Connector, Listener, Socket, SocketType};

/// Socket configuration object.
///
/// ```no_run
/// use std::time::Duration;
///
/// use simple_socket::net::{SocketBuilder, SocketType};
///
/// let mut client = SocketBuilder::new()
///     .kind(SocketType::Stream)
///     .nonblocking(true)
///     .connect_timeout(Duration::from_secs(5))
///     .connector()
///     .expect("Failed to open socket.");
///
/// client.open("127.0.0.1", 6789).expect("Failed to connect.");
/// ```
#[derive(Clone)]
pub struct SocketBuilder {
    kind: SocketType,
    nonblocking: bool,
    connect_timeout: Duration,
    send_timeout: Duration,
    receive_timeout: Duration,
}

impl fmt::Debug for SocketBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketBuilder")
            .field("kind", &self.kind)
            .field("nonblocking", &self.nonblocking)
            .field("connect_timeout", &self.connect_timeout)
            .field("send_timeout", &self.send_timeout)
            .field("receive_timeout", &self.receive_timeout)
            .finish()
    }
}

impl SocketBuilder {
    /// Create a default socket configuration.
    ///
    /// See the other methods on this type for details on the defaults.
    pub fn new() -> Self {
        Self {
            kind: SocketType::Stream,
            nonblocking: false,
            connect_timeout: Duration::ZERO,
            send_timeout: Duration::ZERO,
            receive_timeout: Duration::ZERO,
        }
    }

    /// Set the transport of the socket.
    ///
    /// By default this is [SocketType::Stream].
    pub fn kind(&mut self, kind: SocketType) -> &mut Self {
        self.kind = kind;
        self
    }

    /// Put the socket in non-blocking mode right after it is opened.
    ///
    /// By default sockets are blocking.
    pub fn nonblocking(&mut self, nonblocking: bool) -> &mut Self {
        self.nonblocking = nonblocking;
        self
    }

    /// Set the connect timeout used by non-blocking connects.
    ///
    /// By default this is zero, meaning an in-progress connect is checked once and reported as
    /// timed out if it has not completed yet.
    pub fn connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the send timeout.
    ///
    /// By default this is zero, meaning sends may block indefinitely.
    pub fn send_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the receive timeout.
    ///
    /// By default this is zero, meaning receives may block indefinitely.
    pub fn receive_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.receive_timeout = timeout;
        self
    }

    /// Open and configure a bare [Socket].
    pub fn build(&self) -> Result<Socket> {
        let mut socket = Socket::new(self.kind);
        if !socket.is_valid() {
            return Err(socket.socket_error());
        }

        if self.nonblocking {
            socket.set_nonblocking()?;
        }

        let timeouts = [
            (Timeout::Connect, self.connect_timeout),
            (Timeout::Send, self.send_timeout),
            (Timeout::Receive, self.receive_timeout),
        ];
        for (which, value) in timeouts {
            if !value.is_zero() {
                let result = socket.store_timeout(which, value);
                socket.record(result)?;
            }
        }

        Ok(socket)
    }

    /// Open a configured [Connector].
    pub fn connector(&self) -> Result<Connector> {
        self.build().map(Connector::from)
    }

    /// Open a configured [Listener].
    pub fn listener(&self) -> Result<Listener> {
        self.build().map(Listener::from)
    }
}

impl Default for SocketBuilder {
    fn default() -> Self {
        Self::new()
    }
}
