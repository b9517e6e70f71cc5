//! # simple-socket
//!
//! Synchronous IPv4 TCP and UDP socket handles that put blocking and non-blocking I/O,
//! platform independent error codes and multicast group membership behind one interface. Every
//! operation runs on the calling thread and records its outcome on the handle as a canonical
//! [SocketError], so callers never touch OS specific socket calls directly.
//!
//! The package is split up into a handful of modules:
//! - [net] holds the socket handles themselves, [net::Connector] for the active side and
//!   [net::Listener] for the passive side.
//! - [error] holds the canonical error type and the per platform code translation.
//! - [timer] holds the [StatTimer] every handle uses to time its most recent operation.
//!
//! A simple TCP echo server looks as you would expect:
//!
//! ```no_run
//! use std::thread;
//!
//! use simple_socket::{Listener, Result};
//!
//! fn main() -> Result<()> {
//!     let mut listener = Listener::stream();
//!     listener.listen_default("127.0.0.1", 9091)?;
//!
//!     println!("Listening on: {:?}", listener.local_addr());
//!
//!     // Accept on this thread and hand each connection to its own thread.
//!     loop {
//!         let mut conn = match listener.accept() {
//!             Ok(conn) => conn,
//!             Err(e) => {
//!                 println!("Oh no we had an error: {}", e);
//!                 continue;
//!             }
//!         };
//!
//!         thread::spawn(move || {
//!             while let Ok(read) = conn.receive(1024) {
//!                 if read == 0 {
//!                     break;
//!                 }
//!                 let request = conn.data().to_vec();
//!                 if conn.send(&request).is_err() {
//!                     break;
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! And a client talking to it, connecting without blocking for at most two seconds:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use simple_socket::{Result, SocketBuilder};
//!
//! fn main() -> Result<()> {
//!     let mut client = SocketBuilder::new()
//!         .nonblocking(true)
//!         .connect_timeout(Duration::from_secs(2))
//!         .connector()?;
//!
//!     client.open("127.0.0.1", 9091)?;
//!     println!("Connected in {}us", client.timer().micros());
//!
//!     client.set_blocking()?;
//!     client.send(b"Hello from client!")?;
//!
//!     let read = client.receive(1024)?;
//!     println!("Server response: {}", String::from_utf8_lossy(&client.data()[..read]));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod net;
mod sys;
pub mod timer;

pub use error::{Result, SocketError};
pub use net::{Connector, Direction, Listener, Socket, SocketBuilder, SocketType};
pub use timer::StatTimer;
