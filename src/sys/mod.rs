//! The OS boundary. Everything above this module talks to the kernel exclusively through the
//! functions re-exported here, which take borrowed descriptors and report failures as a
//! translated [crate::error::SocketError]. One backend is compiled in per target.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(not(unix))]
compile_error!("simple-socket only provides a unix socket backend");
