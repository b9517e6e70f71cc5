//! The [self] package handles all logic relating to creating and managing IPv4 socket handles.
//!
//! This module primarily exposes the following objects:
//! - [Socket] which owns a single descriptor along with its configuration, last error, receive
//!   buffer and byte counters, and implements the send and receive paths.
//! - [Connector] which represents an active (client) socket, see [Connector::open].
//! - [Listener] which represents a passive (server) socket that can listen, accept and manage
//!   multicast group membership.
//! - [SocketBuilder] to configure any of the above before use.
//!
//! Every operation is synchronous. Blocking handles suspend the calling thread inside the OS
//! call, non-blocking handles return [crate::error::SocketError::Ewouldblock] or
//! [crate::error::SocketError::Einprogress] instead, with the single exception of the bounded
//! readiness wait performed by a non-blocking [Connector::open].

mod addr;
mod builder;
mod connect;
mod connector;
mod listener;
mod multicast;
mod socket;

pub use addr::{resolve, resolve_or_any};
pub use builder::SocketBuilder;
pub use connect::{ConnectState, PollReadiness, Readiness};
pub use connector::Connector;
pub use listener::{Listener, DEFAULT_BACKLOG};
pub use multicast::Membership;
pub use socket::{AddressingMode, Direction, Socket, SocketType};
