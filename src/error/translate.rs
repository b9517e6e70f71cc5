use super::{statics, SocketError};

/// The OS family whose error numbering a raw code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    /// macOS and the BSDs, which share the historical BSD errno numbering.
    Darwin,
    Windows,
}

impl Platform {
    /// The platform this crate was compiled for.
    pub const fn current() -> Platform {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Platform::Linux
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Darwin
        }
    }
}

/// Classify a raw OS error code as reported on `platform`. This never fails, codes that have no
/// dedicated kind map to [SocketError::SocketError].
///
/// ```
/// use simple_socket::error::{translate, Platform, SocketError};
///
/// assert_eq!(translate(115, Platform::Linux), SocketError::Einprogress);
/// assert_eq!(translate(10035, Platform::Windows), SocketError::Ewouldblock);
/// assert_eq!(translate(-42, Platform::Darwin), SocketError::SocketError);
/// ```
pub fn translate(code: i32, platform: Platform) -> SocketError {
    let table = match platform {
        Platform::Linux => &*statics::LINUX_CODES,
        Platform::Darwin => &*statics::DARWIN_CODES,
        Platform::Windows => &*statics::WINDOWS_CODES,
    };

    table
        .get(&code)
        .copied()
        .unwrap_or(SocketError::SocketError)
}
