use thiserror::Error;

/// Every error kind a session can surface, mirroring the reference
/// implementation's `socks_error_codes` enum one for one.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("connection terminated by peer")]
    ConnectionTerminated,

    #[error("unsupported protocol version: {0:#04x}")]
    InvalidVersion(u8),

    #[error("no acceptable authentication method offered")]
    InvalidAuth,

    #[error("unsupported SOCKS command: {0:#04x}")]
    InvalidCommand(u8),

    #[error("unsupported SOCKS address type: {0:#04x}")]
    InvalidAddressType(u8),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("host unreachable: {0}")]
    HostUnreachable(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("message exceeded the configured buffer size")]
    ExceededMaxBufferSize,

    #[error("timed out waiting for peer")]
    Timeout,

    #[error("malformed HTTP message: {0}")]
    InvalidHttpSyntax(String),

    #[error("editor collaborator failed: {0}")]
    EditorFailed(String),
}

/// Any raw I/O failure while reading or writing a socket is treated as the
/// peer going away — `EPIPE`/`ECONNRESET`/a clean EOF are all observably
/// "the session ends here" from this proxy's point of view. Format-level
/// failures (bad `Content-Length`, bad chunk hex) are never reached through
/// this conversion; the HTTP framer constructs [`ProxyError::InvalidHttpSyntax`]
/// directly from its own parsing, never from an I/O error.
impl From<std::io::Error> for ProxyError {
    fn from(_err: std::io::Error) -> Self {
        ProxyError::ConnectionTerminated
    }
}

/// Classifies a failed destination connect/resolve the way `socks5.c`'s
/// `host_unreachable`/`network_unreachable`/`connection_refused` goto labels
/// do. Rust's stable `io::ErrorKind` doesn't expose the finer POSIX errno
/// split (`ENETUNREACH` vs `EHOSTUNREACH`) without a raw-errno dependency, so
/// anything that isn't clearly a refusal or a timeout falls back to the
/// broader "host unreachable" bucket.
pub fn classify_destination_error(err: &std::io::Error) -> ProxyError {
    use std::io::ErrorKind::*;
    match err.kind() {
        ConnectionRefused => ProxyError::ConnectionRefused(err.to_string()),
        TimedOut | AddrNotAvailable | NotFound => ProxyError::HostUnreachable(err.to_string()),
        _ => ProxyError::HostUnreachable(err.to_string()),
    }
}

/// No address of the hinted family (`AF_INET`) was found for a resolved name.
pub fn no_ipv4_address() -> ProxyError {
    ProxyError::HostUnreachable("resolver returned no IPv4 address".to_string())
}
