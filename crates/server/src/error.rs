use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Failures that stop the reactor from starting or keep running.
///
/// Per-connection I/O failures never show up here: they close the affected connection and
/// the loop carries on.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("socket creation failed: {source}")]
    Socket { source: io::Error },

    #[error("bind {addr} failed: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("listen failed: {source}")]
    Listen { source: io::Error },

    #[error("poll failed: {source}")]
    Poll { source: io::Error },

    #[error("registering with the poller failed: {source}")]
    Register { source: io::Error },

    #[error("server is not bound, call bind before run")]
    NotBound,
}

impl ServerError {
    pub fn socket(source: io::Error) -> Self {
        Self::Socket { source }
    }

    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }

    pub fn listen(source: io::Error) -> Self {
        Self::Listen { source }
    }

    pub fn poll(source: io::Error) -> Self {
        Self::Poll { source }
    }

    pub fn register(source: io::Error) -> Self {
        Self::Register { source }
    }

    /// The underlying OS error number, if the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.io_error().and_then(io::Error::raw_os_error)
    }

    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Socket { source }
            | Self::Bind { source, .. }
            | Self::Listen { source }
            | Self::Poll { source }
            | Self::Register { source } => Some(source),
            Self::NotBound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_os_error_number() {
        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let error = ServerError::bind(addr, io::Error::from_raw_os_error(98));
        assert_eq!(error.raw_os_error(), Some(98));
        assert!(error.to_string().starts_with("bind 127.0.0.1:80 failed: "));
    }

    #[test]
    fn not_bound_has_no_os_error() {
        assert_eq!(ServerError::NotBound.raw_os_error(), None);
        assert!(ServerError::NotBound.io_error().is_none());
    }
}
