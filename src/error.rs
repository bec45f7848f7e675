//! Error types for the echo server and client.

use crate::config::ConfigError;
use crate::ring::RingError;
use std::io;

/// Failures that end a server or client run.
///
/// Ring overflow is not represented here: it is recovered locally by
/// dropping the byte.
#[derive(Debug)]
pub enum EchoError {
    /// Listening endpoint could not be acquired.
    Bind { addr: String, source: io::Error },
    /// Accepting the single inbound connection failed.
    Accept(io::Error),
    /// Outbound connection could not be established.
    Connect { addr: String, source: io::Error },
    /// Reading from an established connection failed.
    Read(io::Error),
    /// Writing to an established connection failed.
    Write(io::Error),
    /// Peer closed the connection while a reply was expected.
    ConnectionClosed,
    Ring(RingError),
    Config(ConfigError),
}

impl std::fmt::Display for EchoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EchoError::Bind { addr, source } => write!(f, "Failed to bind '{addr}': {source}"),
            EchoError::Accept(e) => write!(f, "Failed to accept connection: {e}"),
            EchoError::Connect { addr, source } => {
                write!(f, "Failed to connect to '{addr}': {source}")
            }
            EchoError::Read(e) => write!(f, "Error reading from socket: {e}"),
            EchoError::Write(e) => write!(f, "Error writing to socket: {e}"),
            EchoError::ConnectionClosed => write!(f, "Connection closed by peer"),
            EchoError::Ring(e) => write!(f, "{e}"),
            EchoError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EchoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EchoError::Bind { source, .. } | EchoError::Connect { source, .. } => Some(source),
            EchoError::Accept(e) | EchoError::Read(e) | EchoError::Write(e) => Some(e),
            EchoError::ConnectionClosed => None,
            EchoError::Ring(e) => Some(e),
            EchoError::Config(e) => Some(e),
        }
    }
}

impl From<RingError> for EchoError {
    fn from(e: RingError) -> Self {
        EchoError::Ring(e)
    }
}

impl From<ConfigError> for EchoError {
    fn from(e: ConfigError) -> Self {
        EchoError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_connect() {
        let err = EchoError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to connect to '127.0.0.1:1'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_ring_error() {
        let err: EchoError = RingError::Underflow.into();
        assert_eq!(err.to_string(), "Buffer underflow");
    }
}
