use std::{
    fmt, mem,
    net::SocketAddrV4,
    os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tracing::{debug, trace, warn};

use crate::{
    error::{Result, SocketError},
    sys::{self, IoTimeout},
    timer::StatTimer,
};

use super::SocketBuilder;

/// The transport a handle was created for, fixed for the lifetime of the handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketType {
    /// TCP.
    #[default]
    Stream,
    /// UDP.
    Datagram,
}

/// Which half of a connection [Socket::shutdown] closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Receive,
    Send,
    Both,
}

/// Selects the datagram destination used by [Socket::send] and how a datagram sender is
/// recorded by [Socket::receive].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressingMode {
    /// Send to the peer, and record each sender as the new peer.
    #[default]
    Unicast,
    /// Send to the joined multicast group, senders are only recorded as the last source.
    Multicast,
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Timeout {
    Connect,
    Send,
    Receive,
}

/// State that belongs to the OS descriptor rather than to one handle, shared by every clone.
///
/// `O_NONBLOCK` and the kernel I/O timeouts live on the descriptor, so a change made through one
/// clone must be visible through all of them.
pub(super) struct Descriptor {
    fd: OwnedFd,
    nonblocking: AtomicBool,
    // Microseconds, the resolution of `SO_SNDTIMEO` / `SO_RCVTIMEO`.
    send_timeout: AtomicU64,
    receive_timeout: AtomicU64,
}

impl Descriptor {
    fn new(fd: OwnedFd) -> Descriptor {
        Descriptor {
            fd,
            nonblocking: AtomicBool::new(false),
            send_timeout: AtomicU64::new(0),
            receive_timeout: AtomicU64::new(0),
        }
    }

    pub(super) fn is_nonblocking(&self) -> bool {
        self.nonblocking.load(Ordering::Acquire)
    }

    fn io_timeout(&self, which: IoTimeout) -> Duration {
        let micros = match which {
            IoTimeout::Send => &self.send_timeout,
            IoTimeout::Receive => &self.receive_timeout,
        };
        Duration::from_micros(micros.load(Ordering::Acquire))
    }

    fn set_io_timeout(&self, which: IoTimeout, value: Duration) -> Result<()> {
        sys::set_io_timeout(self.fd.as_fd(), which, value)?;

        let micros = u64::try_from(value.as_micros()).unwrap_or(u64::MAX);
        match which {
            IoTimeout::Send => self.send_timeout.store(micros, Ordering::Release),
            IoTimeout::Receive => self.receive_timeout.store(micros, Ordering::Release),
        }
        Ok(())
    }
}

impl AsFd for Descriptor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// A [Socket] owns one IPv4 descriptor together with everything observed about it: the last
/// canonical error, the bytes placed by the most recent receive, the most recent byte counts and
/// the local and peer addresses.
///
/// The descriptor is opened eagerly on construction, if that fails the handle is simply invalid
/// and every operation reports [SocketError::InvalidSocket].
///
/// # Clones share the descriptor
///
/// Cloning a [Socket] is cheap, the clone refers to the same underlying connection through a
/// reference counted descriptor. [Socket::close] only releases the calling handle's reference,
/// the OS descriptor is closed once the last clone is closed or dropped. The blocking mode and
/// the send and receive timeouts are properties of the descriptor, so setting them through one
/// clone is observed by every other. The connect timeout, the last error, the receive buffer and
/// the counters stay per handle. No synchronisation is provided between clones, so interleaving I/O on two clones from different threads gives no
/// ordering guarantees. To unblock a thread stuck in a blocking call on one clone, call
/// [Socket::shutdown] on another.
#[derive(Clone)]
pub struct Socket {
    fd: Option<Arc<Descriptor>>,
    pub(super) kind: SocketType,
    pub(super) connect_timeout: Duration,
    send_timeout: Duration,
    receive_timeout: Duration,
    error: SocketError,
    data: Vec<u8>,
    bytes_sent: Option<usize>,
    bytes_received: Option<usize>,
    pub(super) local: Option<SocketAddrV4>,
    pub(super) peer: Option<SocketAddrV4>,
    pub(super) group: Option<SocketAddrV4>,
    source: Option<SocketAddrV4>,
    pub(super) addressing: AddressingMode,
    pub(super) timer: StatTimer,
}

impl Socket {
    /// Open a new IPv4 socket of the given type.
    pub fn new(kind: SocketType) -> Socket {
        let (fd, error) = match sys::socket(kind) {
            Ok(fd) => {
                debug!(fd = fd.as_raw_fd(), ?kind, "opened socket");
                (Some(fd), SocketError::Success)
            }
            Err(err) => {
                warn!(?kind, error = %err, "failed to open socket");
                (None, err)
            }
        };

        let mut socket = Socket::empty(kind);
        socket.fd = fd.map(|fd| Arc::new(Descriptor::new(fd)));
        socket.error = error;
        socket
    }

    /// Create a default [SocketBuilder] which can be customized before opening the handle.
    pub fn builder() -> SocketBuilder {
        SocketBuilder::new()
    }

    pub(super) fn from_fd(fd: OwnedFd, kind: SocketType) -> Socket {
        let mut socket = Socket::empty(kind);
        socket.fd = Some(Arc::new(Descriptor::new(fd)));
        socket
    }

    fn empty(kind: SocketType) -> Socket {
        Socket {
            fd: None,
            kind,
            connect_timeout: Duration::ZERO,
            send_timeout: Duration::ZERO,
            receive_timeout: Duration::ZERO,
            error: SocketError::Success,
            data: Vec::new(),
            bytes_sent: None,
            bytes_received: None,
            local: None,
            peer: None,
            group: None,
            source: None,
            addressing: AddressingMode::Unicast,
            timer: StatTimer::new(),
        }
    }

    /// Reset the last error at the start of an operation.
    pub(super) fn begin(&mut self) {
        self.error = SocketError::Success;
    }

    /// Record the outcome of an operation as the last error and hand it back.
    pub(super) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        self.error = match &result {
            Ok(_) => SocketError::Success,
            Err(err) => *err,
        };
        result
    }

    pub(super) fn valid_fd(&self) -> Result<Arc<Descriptor>> {
        self.fd.clone().ok_or(SocketError::InvalidSocket)
    }

    /// Close a partially configured descriptor while keeping `err` as the reported outcome.
    pub(super) fn abort<T>(&mut self, err: SocketError) -> Result<T> {
        if let Some(fd) = self.fd.take() {
            warn!(fd = fd.as_raw_fd(), error = %err, "closing socket after failed setup");
        }
        self.error = err;
        Err(err)
    }

    /// Release this handle's descriptor. Calling this on an already closed handle succeeds.
    pub fn close(&mut self) -> Result<()> {
        self.begin();
        if let Some(fd) = self.fd.take() {
            debug!(
                fd = fd.as_raw_fd(),
                shared = Arc::strong_count(&fd) > 1,
                "closing socket"
            );
        }
        Ok(())
    }

    /// Shut down one or both halves of the connection.
    pub fn shutdown(&mut self, direction: Direction) -> Result<()> {
        self.begin();
        let result = self
            .valid_fd()
            .and_then(|fd| sys::shutdown(fd.as_fd(), direction));
        self.record(result)
    }

    pub fn set_nonblocking(&mut self) -> Result<()> {
        self.set_blocking_mode(true)
    }

    pub fn set_blocking(&mut self) -> Result<()> {
        self.set_blocking_mode(false)
    }

    fn set_blocking_mode(&mut self, nonblocking: bool) -> Result<()> {
        self.begin();
        let result = self.valid_fd().and_then(|fd| {
            sys::set_nonblocking(fd.as_fd(), nonblocking)?;
            fd.nonblocking.store(nonblocking, Ordering::Release);
            Ok(())
        });
        self.record(result)
    }

    /// Whether the descriptor is in non-blocking mode, as set through this handle or any clone.
    pub fn is_nonblocking(&self) -> bool {
        self.fd.as_ref().is_some_and(|fd| fd.is_nonblocking())
    }

    /// Set how long a non-blocking [super::Connector::open] waits for the connection to
    /// complete. Zero means the readiness check returns immediately.
    pub fn set_connect_timeout(&mut self, secs: u64, micros: u32) -> Result<()> {
        self.set_timeout(Timeout::Connect, secs, micros)
    }

    /// Set the send timeout, also applied to the descriptor as `SO_SNDTIMEO`. Zero means block
    /// indefinitely.
    pub fn set_send_timeout(&mut self, secs: u64, micros: u32) -> Result<()> {
        self.set_timeout(Timeout::Send, secs, micros)
    }

    /// Set the receive timeout, also applied to the descriptor as `SO_RCVTIMEO`. Zero means
    /// block indefinitely.
    pub fn set_receive_timeout(&mut self, secs: u64, micros: u32) -> Result<()> {
        self.set_timeout(Timeout::Receive, secs, micros)
    }

    fn set_timeout(&mut self, which: Timeout, secs: u64, micros: u32) -> Result<()> {
        self.begin();
        let result = match micros {
            0..=999_999 => self.store_timeout(which, Duration::new(secs, micros * 1_000)),
            _ => Err(SocketError::InvalidTimeout),
        };
        self.record(result)
    }

    pub(super) fn store_timeout(&mut self, which: Timeout, value: Duration) -> Result<()> {
        let os_timeout = match which {
            Timeout::Connect => None,
            Timeout::Send => Some(IoTimeout::Send),
            Timeout::Receive => Some(IoTimeout::Receive),
        };

        if let (Some(os_timeout), Some(fd)) = (os_timeout, &self.fd) {
            fd.set_io_timeout(os_timeout, value)?;
        }

        match which {
            Timeout::Connect => self.connect_timeout = value,
            Timeout::Send => self.send_timeout = value,
            Timeout::Receive => self.receive_timeout = value,
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// The send timeout of the descriptor, or the last value set through this handle once it is
    /// closed.
    pub fn send_timeout(&self) -> Duration {
        match &self.fd {
            Some(fd) => fd.io_timeout(IoTimeout::Send),
            None => self.send_timeout,
        }
    }

    /// The receive timeout of the descriptor, or the last value set through this handle once it
    /// is closed.
    pub fn receive_timeout(&self) -> Duration {
        match &self.fd {
            Some(fd) => fd.io_timeout(IoTimeout::Receive),
            None => self.receive_timeout,
        }
    }

    /// Send `buf`, returning the number of bytes the OS accepted.
    ///
    /// Stream sockets may accept fewer bytes than requested, callers must be prepared to loop.
    /// Datagram sockets address the peer in [AddressingMode::Unicast] and the joined group in
    /// [AddressingMode::Multicast]. An empty buffer is a no-op that leaves the byte counter unset.
    pub fn send(&mut self, buf: &[u8]) -> Result<usize> {
        self.begin();
        self.bytes_sent = None;

        let fd = match self.valid_fd() {
            Ok(fd) => fd,
            Err(err) => return self.record(Err(err)),
        };
        if buf.is_empty() {
            return Ok(0);
        }

        let result = match self.kind {
            SocketType::Stream => self.timer.measure(|| sys::send_stream(fd.as_fd(), buf)),
            SocketType::Datagram => match self.send_target() {
                Some(addr) => self
                    .timer
                    .measure(|| sys::send_datagram(fd.as_fd(), buf, addr)),
                None => Err(SocketError::InvalidAddress),
            },
        };

        if let Ok(sent) = result {
            trace!(fd = fd.as_raw_fd(), sent, requested = buf.len(), "sent");
            self.bytes_sent = Some(sent);
        }
        self.record(result)
    }

    fn send_target(&self) -> Option<SocketAddrV4> {
        match self.addressing {
            AddressingMode::Unicast => self.peer,
            AddressingMode::Multicast => self.group,
        }
    }

    /// Receive up to `max_len` bytes into the handle's buffer, see [Socket::data]. A `max_len`
    /// of zero is a no-op that leaves the buffer and byte counter untouched.
    ///
    /// The buffer is reused between calls and grown to `max_len` up front. A `max_len` the
    /// allocator cannot satisfy fails with [SocketError::SocketError] instead of aborting.
    pub fn receive(&mut self, max_len: usize) -> Result<usize> {
        self.begin();
        self.bytes_received = None;

        let fd = match self.valid_fd() {
            Ok(fd) => fd,
            Err(err) => return self.record(Err(err)),
        };
        if max_len == 0 {
            return Ok(0);
        }

        let mut buf = mem::take(&mut self.data);
        buf.clear();
        if buf.try_reserve(max_len).is_err() {
            warn!(fd = fd.as_raw_fd(), max_len, "receive buffer allocation failed");
            self.data = buf;
            return self.record(Err(SocketError::SocketError));
        }
        buf.resize(max_len, 0);

        let result = match self.kind {
            SocketType::Stream => self.timer.measure(|| sys::recv_stream(fd.as_fd(), &mut buf)),
            SocketType::Datagram => self
                .timer
                .measure(|| sys::recv_datagram(fd.as_fd(), &mut buf))
                .map(|(read, from)| {
                    if let Some(from) = from {
                        self.note_source(from);
                    }
                    read
                }),
        };

        match result {
            Ok(read) => {
                trace!(fd = fd.as_raw_fd(), read, "received");
                buf.truncate(read);
                self.data = buf;
                self.bytes_received = Some(read);
            }
            Err(_) => {
                buf.clear();
                self.data = buf;
            }
        }
        self.record(result)
    }

    fn note_source(&mut self, from: SocketAddrV4) {
        self.source = Some(from);
        if self.addressing == AddressingMode::Unicast {
            self.peer = Some(from);
        }
    }

    /// The bytes placed by the most recent successful receive.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes accepted by the most recent send, `None` if it did not reach the OS.
    pub fn bytes_sent(&self) -> Option<usize> {
        self.bytes_sent
    }

    /// Bytes read by the most recent receive, `None` if it did not reach the OS.
    pub fn bytes_received(&self) -> Option<usize> {
        self.bytes_received
    }

    /// The canonical outcome of the most recent operation.
    pub fn socket_error(&self) -> SocketError {
        self.error
    }

    pub fn is_valid(&self) -> bool {
        self.fd.is_some()
    }

    pub fn kind(&self) -> SocketType {
        self.kind
    }

    pub fn descriptor(&self) -> Option<RawFd> {
        self.fd.as_ref().map(|fd| fd.as_raw_fd())
    }

    pub fn local_addr(&self) -> Option<SocketAddrV4> {
        self.local
    }

    pub fn peer_addr(&self) -> Option<SocketAddrV4> {
        self.peer
    }

    /// The sender of the most recent datagram, in either addressing mode.
    pub fn last_source(&self) -> Option<SocketAddrV4> {
        self.source
    }

    pub fn addressing(&self) -> AddressingMode {
        self.addressing
    }

    /// Timing of the most recent timed operation.
    pub fn timer(&self) -> &StatTimer {
        &self.timer
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("fd", &self.descriptor())
            .field("kind", &self.kind)
            .field("nonblocking", &self.is_nonblocking())
            .field("error", &self.error)
            .field("local", &self.local)
            .field("peer", &self.peer)
            .field("addressing", &self.addressing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sockets_are_created() {
        let socket = Socket::new(SocketType::Stream);
        assert!(socket.is_valid());
        assert!(socket.descriptor().is_some());
        assert_eq!(socket.socket_error(), SocketError::Success);
        assert_eq!(socket.kind(), SocketType::Stream);
        assert!(!socket.is_nonblocking());
    }

    #[test]
    fn toggle_blocking_mode() {
        for kind in [SocketType::Stream, SocketType::Datagram] {
            let mut socket = Socket::new(kind);

            assert_eq!(socket.set_nonblocking(), Ok(()));
            assert!(socket.is_nonblocking());

            assert_eq!(socket.set_blocking(), Ok(()));
            assert_eq!(socket.socket_error(), SocketError::Success);
            assert!(!socket.is_nonblocking());

            assert_eq!(socket.set_nonblocking(), Ok(()));
            assert!(socket.is_nonblocking());
        }
    }

    #[test]
    fn invalid_socket_rejects_everything() {
        let mut socket = Socket::new(SocketType::Stream);
        socket.close().unwrap();

        assert!(!socket.is_nonblocking());
        assert_eq!(socket.set_nonblocking(), Err(SocketError::InvalidSocket));
        assert_eq!(socket.set_blocking(), Err(SocketError::InvalidSocket));
        assert_eq!(socket.send(b"data"), Err(SocketError::InvalidSocket));
        assert_eq!(socket.receive(16), Err(SocketError::InvalidSocket));
        assert_eq!(
            socket.shutdown(Direction::Both),
            Err(SocketError::InvalidSocket)
        );
        assert_eq!(socket.socket_error(), SocketError::InvalidSocket);
    }

    #[test]
    fn close_is_idempotent() {
        let mut socket = Socket::new(SocketType::Datagram);
        assert_eq!(socket.close(), Ok(()));
        assert!(!socket.is_valid());
        assert_eq!(socket.close(), Ok(()));
        assert_eq!(socket.socket_error(), SocketError::Success);
    }

    #[test]
    fn clones_share_descriptor_state() {
        let mut alpha = Socket::new(SocketType::Stream);
        let mut beta = alpha.clone();

        assert_eq!(alpha.set_nonblocking(), Ok(()));
        assert!(beta.is_nonblocking());

        assert_eq!(beta.set_receive_timeout(1, 250_000), Ok(()));
        assert_eq!(alpha.receive_timeout(), Duration::from_micros(1_250_000));
        assert_eq!(alpha.set_send_timeout(3, 0), Ok(()));
        assert_eq!(beta.send_timeout(), Duration::from_secs(3));

        // The connect timeout is only consulted by the handle that connects.
        assert_eq!(alpha.set_connect_timeout(2, 0), Ok(()));
        assert_eq!(beta.connect_timeout(), Duration::ZERO);

        assert_eq!(beta.set_blocking(), Ok(()));
        assert!(!alpha.is_nonblocking());

        beta.close().unwrap();
        assert!(!beta.is_nonblocking());
        assert_eq!(beta.receive_timeout(), Duration::from_micros(1_250_000));
    }

    #[test]
    fn oversized_receive_fails_without_aborting() {
        let mut socket = Socket::new(SocketType::Datagram);

        assert_eq!(socket.receive(usize::MAX), Err(SocketError::SocketError));
        assert_eq!(socket.bytes_received(), None);
        assert!(socket.data().is_empty());
        assert!(socket.is_valid());
    }

    #[test]
    fn timeouts_are_validated() {
        let mut socket = Socket::new(SocketType::Stream);

        assert_eq!(socket.connect_timeout(), Duration::ZERO);
        assert_eq!(socket.set_connect_timeout(5, 500), Ok(()));
        assert_eq!(socket.connect_timeout().as_secs(), 5);
        assert_eq!(socket.connect_timeout().subsec_micros(), 500);

        assert_eq!(
            socket.set_connect_timeout(1, 1_000_000),
            Err(SocketError::InvalidTimeout)
        );
        assert_eq!(socket.socket_error(), SocketError::InvalidTimeout);
        assert_eq!(socket.connect_timeout().as_secs(), 5);

        assert_eq!(socket.set_send_timeout(2, 500), Ok(()));
        assert_eq!(socket.send_timeout(), Duration::new(2, 500_000));
        assert_eq!(socket.set_receive_timeout(0, 250_000), Ok(()));
        assert_eq!(socket.receive_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn empty_buffers_are_noops() {
        let mut socket = Socket::new(SocketType::Datagram);

        assert_eq!(socket.send(&[]), Ok(0));
        assert_eq!(socket.bytes_sent(), None);
        assert_eq!(socket.receive(0), Ok(0));
        assert_eq!(socket.bytes_received(), None);
        assert_eq!(socket.socket_error(), SocketError::Success);
    }

    #[test]
    fn datagram_without_destination() {
        let mut socket = Socket::new(SocketType::Datagram);
        assert_eq!(socket.send(b"hello"), Err(SocketError::InvalidAddress));
        assert_eq!(socket.bytes_sent(), None);
    }

    #[test]
    fn clones_share_the_descriptor() {
        let mut alpha = Socket::new(SocketType::Stream);
        let mut beta = alpha.clone();

        assert_eq!(alpha.descriptor(), beta.descriptor());

        beta.close().unwrap();
        assert!(!beta.is_valid());
        assert!(alpha.is_valid());
        assert_eq!(alpha.set_nonblocking(), Ok(()));

        alpha.close().unwrap();
        assert_eq!(alpha.send(b"x"), Err(SocketError::InvalidSocket));
    }
}
