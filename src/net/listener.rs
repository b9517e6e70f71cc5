use std::{
    net::{Ipv4Addr, SocketAddrV4},
    ops::{Deref, DerefMut},
    os::fd::{AsFd, AsRawFd},
};

use tracing::{debug, trace};

use crate::{
    error::{Result, SocketError},
    sys,
};

use super::{addr, AddressingMode, Connector, Membership, Socket, SocketType};

/// Backlog used by [Listener::listen_default].
pub const DEFAULT_BACKLOG: i32 = 1024;

/// A [Listener] represents the passive (server) side of a socket. Stream listeners accept
/// incoming connections, datagram listeners simply receive on their bound address and may join
/// multicast groups.
///
/// Any setup step that fails after the descriptor has been partially configured closes the
/// descriptor, the original failure is still reported as the result and as
/// [Socket::socket_error].
///
/// # Examples
///
/// ```no_run
/// use simple_socket::net::Listener;
///
/// let mut listener = Listener::stream();
/// listener.listen("127.0.0.1", 6789, 16).expect("Failed to listen on specified address.");
///
/// loop {
///     let mut conn = listener.accept().expect("Failed to accept connection.");
///     println!("Got connection from: {:?}", conn.peer_addr());
///
///     let read = conn.receive(1024).expect("Failed to receive from client.");
///     let request = conn.data()[..read].to_vec();
///     conn.send(&request).expect("Failed to respond to client.");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Listener {
    socket: Socket,
    interface: Option<Ipv4Addr>,
    membership: Option<Membership>,
}

impl Listener {
    pub fn new(kind: SocketType) -> Listener {
        Listener::from(Socket::new(kind))
    }

    pub fn stream() -> Listener {
        Listener::new(SocketType::Stream)
    }

    pub fn datagram() -> Listener {
        Listener::new(SocketType::Datagram)
    }

    /// Bind to `host:port` with address reuse enabled, an empty host meaning every interface.
    /// Stream listeners additionally start queueing up to `backlog` incoming connections, the
    /// value being clamped to what the OS supports. Port `0` lets the OS pick a free port, see
    /// [Socket::local_addr].
    pub fn listen(&mut self, host: &str, port: u16, backlog: i32) -> Result<()> {
        self.socket.begin();
        let result = self.try_listen(host, port, backlog);
        self.socket.record(result)
    }

    /// [Listener::listen] with [DEFAULT_BACKLOG].
    pub fn listen_default(&mut self, host: &str, port: u16) -> Result<()> {
        self.listen(host, port, DEFAULT_BACKLOG)
    }

    fn try_listen(&mut self, host: &str, port: u16, backlog: i32) -> Result<()> {
        let fd = self.socket.valid_fd()?;
        let addr = addr::resolve_or_any(host, port)?;

        let kind = self.socket.kind;
        let bound = self.socket.timer.measure(|| {
            sys::set_reuse_addr(fd.as_fd())?;
            sys::bind_to(fd.as_fd(), addr)?;
            if kind == SocketType::Stream {
                sys::listen_on(fd.as_fd(), backlog)?;
            }
            sys::local_addr(fd.as_fd())
        });

        let local = match bound {
            Ok(local) => local,
            Err(err) => return self.socket.abort(err),
        };

        debug!(fd = fd.as_raw_fd(), %local, ?kind, backlog, "listening");
        self.socket.local = Some(local);
        self.interface = Some(*addr.ip());
        Ok(())
    }

    /// Bind a datagram listener to `iface:port` and join `group` on that interface. An empty
    /// interface binds the wildcard address and lets the OS pick the interface for the group,
    /// which is what most receivers want since a socket bound to a unicast address does not see
    /// traffic sent to the group.
    ///
    /// On success the handle switches to [AddressingMode::Multicast], sends then go to
    /// `group:port`.
    pub fn bind_multicast(&mut self, iface: &str, group: &str, port: u16) -> Result<()> {
        self.socket.begin();
        let result = self.try_bind_multicast(iface, group, port);
        self.socket.record(result)
    }

    fn try_bind_multicast(&mut self, iface: &str, group: &str, port: u16) -> Result<()> {
        self.require(SocketType::Datagram)?;
        let fd = self.socket.valid_fd()?;
        let iface = addr::parse_interface(iface)?;
        let group = addr::parse_group(group)?;

        let bound = self.socket.timer.measure(|| {
            sys::set_reuse_addr(fd.as_fd())?;
            sys::bind_to(fd.as_fd(), SocketAddrV4::new(iface, port))?;
            sys::join_multicast(fd.as_fd(), group, iface)?;
            sys::local_addr(fd.as_fd())
        });

        let local = match bound {
            Ok(local) => local,
            Err(err) => return self.socket.abort(err),
        };

        self.socket.local = Some(local);
        self.interface = Some(iface);
        self.enter_group(group);
        debug!(fd = fd.as_raw_fd(), %local, %group, %iface, "bound multicast listener");
        Ok(())
    }

    /// Join `group` on the interface recorded by the last bind. Failing to join closes the
    /// handle.
    pub fn join(&mut self, group: &str) -> Result<()> {
        self.socket.begin();
        let result = self.try_membership(group, true);
        self.socket.record(result)
    }

    /// Leave `group` on the interface recorded by the last bind. Leaving the group the handle is
    /// currently addressing switches it back to [AddressingMode::Unicast]. Failing to leave
    /// closes the handle.
    pub fn leave(&mut self, group: &str) -> Result<()> {
        self.socket.begin();
        let result = self.try_membership(group, false);
        self.socket.record(result)
    }

    fn try_membership(&mut self, group: &str, join: bool) -> Result<()> {
        self.require(SocketType::Datagram)?;
        let fd = self.socket.valid_fd()?;
        let group = addr::parse_group(group)?;
        let iface = self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED);

        let result = match join {
            true => sys::join_multicast(fd.as_fd(), group, iface),
            false => sys::leave_multicast(fd.as_fd(), group, iface),
        };
        if let Err(err) = result {
            return self.socket.abort(err);
        }

        trace!(fd = fd.as_raw_fd(), %group, %iface, join, "multicast membership");
        if join {
            self.enter_group(group);
        } else if self.membership.map(|m| m.group()) == Some(group) {
            self.membership = None;
            self.socket.group = None;
            self.socket.addressing = AddressingMode::Unicast;
        }
        Ok(())
    }

    fn enter_group(&mut self, group: Ipv4Addr) {
        let iface = self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED);
        let port = self.socket.local.map(|local| local.port()).unwrap_or(0);

        self.membership = Some(Membership::new(group, iface));
        self.socket.group = Some(SocketAddrV4::new(group, port));
        self.socket.addressing = AddressingMode::Multicast;
    }

    /// Accept one pending connection, blocking unless the listener is non-blocking. Interrupted
    /// accepts are retried. The returned [Connector] owns the new descriptor and already has its
    /// local and peer addresses recorded.
    pub fn accept(&mut self) -> Result<Connector> {
        self.socket.begin();
        let result = self.try_accept();
        self.socket.record(result)
    }

    fn try_accept(&mut self) -> Result<Connector> {
        self.require(SocketType::Stream)?;
        let fd = self.socket.valid_fd()?;

        let accepted = self.socket.timer.measure(|| loop {
            match sys::accept_on(fd.as_fd()) {
                Err(SocketError::Interrupted) => {
                    trace!(fd = fd.as_raw_fd(), "accept interrupted, retrying");
                    continue;
                }
                result => break result,
            }
        })?;

        let local = sys::local_addr(accepted.as_fd()).ok().or(self.socket.local);
        let peer = sys::peer_addr(accepted.as_fd()).ok();

        let mut conn = Socket::from_fd(accepted, SocketType::Stream);
        conn.local = local;
        conn.peer = peer;
        debug!(fd = ?conn.descriptor(), local = ?local, peer = ?peer, "accepted connection");

        Ok(Connector::accepted(conn))
    }

    fn require(&self, kind: SocketType) -> Result<()> {
        match self.socket.kind == kind {
            true => Ok(()),
            false => Err(SocketError::ProtocolError),
        }
    }

    /// The multicast group currently joined, if any.
    pub fn membership(&self) -> Option<Membership> {
        self.membership
    }

    /// Give up the listener role and return the underlying handle.
    pub fn into_socket(self) -> Socket {
        self.socket
    }
}

impl From<Socket> for Listener {
    fn from(socket: Socket) -> Self {
        Listener {
            socket,
            interface: None,
            membership: None,
        }
    }
}

impl Deref for Listener {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl DerefMut for Listener {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}
