use std::{
    net::{Ipv4Addr, SocketAddrV4},
    os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd},
    time::Duration,
};

use nix::{
    fcntl::{fcntl, FcntlArg, OFlag},
    libc,
    poll::{poll, PollFd, PollFlags, PollTimeout},
    sys::{
        socket::{
            self, accept, bind, getpeername, getsockname, getsockopt, listen, recv, recvfrom,
            send, sendto, setsockopt, sockopt, AddressFamily, Backlog, IpMembershipRequest,
            MsgFlags, SockFlag, SockType, SockaddrIn,
        },
        time::TimeVal,
    },
};

use crate::{
    error::{Result, SocketError},
    net::{Direction, SocketType},
};

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: MsgFlags = MsgFlags::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: MsgFlags = MsgFlags::empty();

/// Which kernel enforced I/O timeout to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IoTimeout {
    Send,
    Receive,
}

pub(crate) fn socket(kind: SocketType) -> Result<OwnedFd> {
    let ty = match kind {
        SocketType::Stream => SockType::Stream,
        SocketType::Datagram => SockType::Datagram,
    };

    socket::socket(AddressFamily::Inet, ty, SockFlag::empty(), None).map_err(SocketError::from)
}

pub(crate) fn set_nonblocking(fd: BorrowedFd<'_>, enabled: bool) -> Result<()> {
    let bits = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL)?;
    let mut flags = OFlag::from_bits_truncate(bits);
    flags.set(OFlag::O_NONBLOCK, enabled);

    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags))?;
    Ok(())
}

pub(crate) fn set_reuse_addr(fd: BorrowedFd<'_>) -> Result<()> {
    setsockopt(&fd, sockopt::ReuseAddr, &true).map_err(SocketError::from)
}

pub(crate) fn set_io_timeout(fd: BorrowedFd<'_>, which: IoTimeout, value: Duration) -> Result<()> {
    let tv = TimeVal::new(
        value.as_secs() as libc::time_t,
        value.subsec_micros() as libc::suseconds_t,
    );

    match which {
        IoTimeout::Send => setsockopt(&fd, sockopt::SendTimeout, &tv),
        IoTimeout::Receive => setsockopt(&fd, sockopt::ReceiveTimeout, &tv),
    }
    .map_err(SocketError::from)
}

pub(crate) fn connect(fd: BorrowedFd<'_>, addr: SocketAddrV4) -> Result<()> {
    let addr = SockaddrIn::from(addr);
    socket::connect(fd.as_raw_fd(), &addr).map_err(SocketError::from)
}

pub(crate) fn bind_to(fd: BorrowedFd<'_>, addr: SocketAddrV4) -> Result<()> {
    let addr = SockaddrIn::from(addr);
    bind(fd.as_raw_fd(), &addr).map_err(SocketError::from)
}

pub(crate) fn listen_on(fd: BorrowedFd<'_>, backlog: i32) -> Result<()> {
    let backlog = backlog.clamp(0, libc::SOMAXCONN);
    listen(&fd, Backlog::new(backlog)?).map_err(SocketError::from)
}

pub(crate) fn accept_on(fd: BorrowedFd<'_>) -> Result<OwnedFd> {
    let raw = accept(fd.as_raw_fd())?;
    // SAFETY: accept(2) just handed us this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

pub(crate) fn local_addr(fd: BorrowedFd<'_>) -> Result<SocketAddrV4> {
    let addr: SockaddrIn = getsockname(fd.as_raw_fd())?;
    Ok(SocketAddrV4::from(addr))
}

pub(crate) fn peer_addr(fd: BorrowedFd<'_>) -> Result<SocketAddrV4> {
    let addr: SockaddrIn = getpeername(fd.as_raw_fd())?;
    Ok(SocketAddrV4::from(addr))
}

pub(crate) fn send_stream(fd: BorrowedFd<'_>, buf: &[u8]) -> Result<usize> {
    send(fd.as_raw_fd(), buf, SEND_FLAGS).map_err(SocketError::from)
}

pub(crate) fn send_datagram(fd: BorrowedFd<'_>, buf: &[u8], addr: SocketAddrV4) -> Result<usize> {
    let addr = SockaddrIn::from(addr);
    sendto(fd.as_raw_fd(), buf, &addr, SEND_FLAGS).map_err(SocketError::from)
}

pub(crate) fn recv_stream(fd: BorrowedFd<'_>, buf: &mut [u8]) -> Result<usize> {
    recv(fd.as_raw_fd(), buf, MsgFlags::empty()).map_err(SocketError::from)
}

pub(crate) fn recv_datagram(
    fd: BorrowedFd<'_>,
    buf: &mut [u8],
) -> Result<(usize, Option<SocketAddrV4>)> {
    let (read, addr) = recvfrom::<SockaddrIn>(fd.as_raw_fd(), buf)?;
    Ok((read, addr.map(SocketAddrV4::from)))
}

pub(crate) fn shutdown(fd: BorrowedFd<'_>, direction: Direction) -> Result<()> {
    let how = match direction {
        Direction::Receive => socket::Shutdown::Read,
        Direction::Send => socket::Shutdown::Write,
        Direction::Both => socket::Shutdown::Both,
    };
    socket::shutdown(fd.as_raw_fd(), how).map_err(SocketError::from)
}

pub(crate) fn join_multicast(fd: BorrowedFd<'_>, group: Ipv4Addr, iface: Ipv4Addr) -> Result<()> {
    let request = IpMembershipRequest::new(group, Some(iface));
    setsockopt(&fd, sockopt::IpAddMembership, &request).map_err(SocketError::from)
}

pub(crate) fn leave_multicast(fd: BorrowedFd<'_>, group: Ipv4Addr, iface: Ipv4Addr) -> Result<()> {
    let request = IpMembershipRequest::new(group, Some(iface));
    setsockopt(&fd, sockopt::IpDropMembership, &request).map_err(SocketError::from)
}

/// Wait up to `timeout` for the descriptor to become writable, returning `false` if the timeout
/// elapsed first. Sub-millisecond remainders are rounded up so the wait never ends early.
pub(crate) fn wait_writable(fd: BorrowedFd<'_>, timeout: Duration) -> Result<bool> {
    let millis = timeout.as_micros().div_ceil(1000);
    let millis = i32::try_from(millis).unwrap_or(i32::MAX);
    let timeout = PollTimeout::try_from(millis).unwrap_or(PollTimeout::NONE);

    let mut fds = [PollFd::new(fd, PollFlags::POLLOUT)];
    match poll(&mut fds, timeout)? {
        0 => Ok(false),
        _ => Ok(true),
    }
}

/// Fetch and clear the pending asynchronous error on the socket, `SO_ERROR`.
pub(crate) fn take_error(fd: BorrowedFd<'_>) -> Result<Option<SocketError>> {
    let code = getsockopt(&fd, sockopt::SocketError)?;
    match code {
        0 => Ok(None),
        code => Ok(Some(SocketError::from(code))),
    }
}
