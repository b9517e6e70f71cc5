use std::collections::HashMap;

use lazy_static::lazy_static;

use super::SocketError;

type CodeTable = HashMap<i32, SocketError>;

// Raw values are taken from the platform headers rather than `nix::errno` so that every table is
// available on every host.
const LINUX: &[(i32, SocketError)] = &[
    (0, SocketError::Success),
    (4, SocketError::Interrupted),       // EINTR
    (9, SocketError::InvalidSocket),     // EBADF
    (11, SocketError::Ewouldblock),      // EAGAIN / EWOULDBLOCK
    (12, SocketError::InvalidSocket),    // ENOMEM
    (13, SocketError::InvalidSocket),    // EACCES
    (14, SocketError::SocketError),      // EFAULT
    (22, SocketError::ProtocolError),    // EINVAL
    (23, SocketError::InvalidSocket),    // ENFILE
    (24, SocketError::InvalidSocket),    // EMFILE
    (32, SocketError::InvalidSocket),    // EPIPE
    (71, SocketError::ProtocolError),    // EPROTO
    (88, SocketError::InvalidSocket),    // ENOTSOCK
    (93, SocketError::InvalidSocket),    // EPROTONOSUPPORT
    (95, SocketError::InvalidSocket),    // EOPNOTSUPP
    (97, SocketError::InvalidSocket),    // EAFNOSUPPORT
    (98, SocketError::AddressInUse),     // EADDRINUSE
    (99, SocketError::InvalidAddress),   // EADDRNOTAVAIL
    (103, SocketError::ConnectionAborted), // ECONNABORTED
    (104, SocketError::ConnectionReset), // ECONNRESET
    (105, SocketError::InvalidSocket),   // ENOBUFS
    (106, SocketError::AlreadyConnected), // EISCONN
    (107, SocketError::NotConnected),    // ENOTCONN
    (110, SocketError::Timedout),        // ETIMEDOUT
    (111, SocketError::ConnectionRefused), // ECONNREFUSED
    (114, SocketError::Einprogress),     // EALREADY
    (115, SocketError::Einprogress),     // EINPROGRESS
];

const DARWIN: &[(i32, SocketError)] = &[
    (0, SocketError::Success),
    (4, SocketError::Interrupted),       // EINTR
    (9, SocketError::InvalidSocket),     // EBADF
    (12, SocketError::InvalidSocket),    // ENOMEM
    (13, SocketError::InvalidSocket),    // EACCES
    (14, SocketError::SocketError),      // EFAULT
    (22, SocketError::ProtocolError),    // EINVAL
    (23, SocketError::InvalidSocket),    // ENFILE
    (24, SocketError::InvalidSocket),    // EMFILE
    (32, SocketError::InvalidSocket),    // EPIPE
    (35, SocketError::Ewouldblock),      // EAGAIN / EWOULDBLOCK
    (36, SocketError::Einprogress),      // EINPROGRESS
    (37, SocketError::Einprogress),      // EALREADY
    (38, SocketError::InvalidSocket),    // ENOTSOCK
    (43, SocketError::InvalidSocket),    // EPROTONOSUPPORT
    (45, SocketError::InvalidSocket),    // EOPNOTSUPP
    (47, SocketError::InvalidSocket),    // EAFNOSUPPORT
    (48, SocketError::AddressInUse),     // EADDRINUSE
    (49, SocketError::InvalidAddress),   // EADDRNOTAVAIL
    (53, SocketError::ConnectionAborted), // ECONNABORTED
    (54, SocketError::ConnectionReset),  // ECONNRESET
    (55, SocketError::InvalidSocket),    // ENOBUFS
    (56, SocketError::AlreadyConnected), // EISCONN
    (57, SocketError::NotConnected),     // ENOTCONN
    (60, SocketError::Timedout),         // ETIMEDOUT
    (61, SocketError::ConnectionRefused), // ECONNREFUSED
    (100, SocketError::ProtocolError),   // EPROTO
];

const WINDOWS: &[(i32, SocketError)] = &[
    (0, SocketError::Success),
    (10004, SocketError::Interrupted),       // WSAEINTR
    (10009, SocketError::InvalidSocket),     // WSAEBADF
    (10013, SocketError::InvalidSocket),     // WSAEACCES
    (10014, SocketError::SocketError),       // WSAEFAULT
    (10022, SocketError::ProtocolError),     // WSAEINVAL
    (10024, SocketError::InvalidSocket),     // WSAEMFILE
    (10035, SocketError::Ewouldblock),       // WSAEWOULDBLOCK
    (10036, SocketError::Einprogress),       // WSAEINPROGRESS
    (10037, SocketError::Einprogress),       // WSAEALREADY
    (10038, SocketError::InvalidSocket),     // WSAENOTSOCK
    (10043, SocketError::InvalidSocket),     // WSAEPROTONOSUPPORT
    (10045, SocketError::InvalidSocket),     // WSAEOPNOTSUPP
    (10047, SocketError::InvalidSocket),     // WSAEAFNOSUPPORT
    (10048, SocketError::AddressInUse),      // WSAEADDRINUSE
    (10049, SocketError::InvalidAddress),    // WSAEADDRNOTAVAIL
    (10053, SocketError::ConnectionAborted), // WSAECONNABORTED
    (10054, SocketError::ConnectionReset),   // WSAECONNRESET
    (10055, SocketError::InvalidSocket),     // WSAENOBUFS
    (10056, SocketError::AlreadyConnected),  // WSAEISCONN
    (10057, SocketError::NotConnected),      // WSAENOTCONN
    (10060, SocketError::Timedout),          // WSAETIMEDOUT
    (10061, SocketError::ConnectionRefused), // WSAECONNREFUSED
];

lazy_static! {
    pub(super) static ref LINUX_CODES: CodeTable = LINUX.iter().copied().collect();
    pub(super) static ref DARWIN_CODES: CodeTable = DARWIN.iter().copied().collect();
    pub(super) static ref WINDOWS_CODES: CodeTable = WINDOWS.iter().copied().collect();
}
