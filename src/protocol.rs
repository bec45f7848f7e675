//! Wire-level constants shared by the server and the client.
//!
//! There is no framing: a message is whatever byte span a single read
//! returns. Every read event on the server is answered with one write of
//! [`ACK`].

/// Port the server listens on by default.
pub const DEFAULT_PORT: u16 = 12345;

/// Maximum bytes taken from the socket per read, on both ends.
pub const CHUNK_SIZE: usize = 1024;

/// Default ring capacity for a server session.
pub const RING_CAPACITY: usize = 1024;

/// Acknowledgment written after each processed read event.
pub const ACK: &[u8] = b"Message received";

/// Pause between scripted client messages, in milliseconds.
pub const PACE_MS: u64 = 1000;

/// Messages the client sends when none are configured.
pub const SCRIPT: [&str; 3] = ["Hello from client!", "This is message 2", "This is message 3"];

/// Default server bind address (all IPv4 interfaces).
pub fn default_listen() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

/// Default client target address.
pub fn default_connect() -> String {
    format!("127.0.0.1:{DEFAULT_PORT}")
}
