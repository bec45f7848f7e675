//! Single-session TCP echo server.
//!
//! The server binds one listening endpoint, accepts exactly one connection,
//! stages every received byte into a [`RingBuffer`] and answers each read
//! event with a fixed acknowledgment. It stops when the peer closes the
//! connection or a transport error occurs.

use crate::config::ServerSettings;
use crate::error::EchoError;
use crate::ring::RingBuffer;
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};

/// Owned listening endpoint that can accept exactly once.
pub struct Listener {
    inner: std::net::TcpListener,
    addr: SocketAddr,
}

impl Listener {
    /// Bind a blocking listener on `addr`.
    pub fn bind(addr: &str) -> Result<Self, EchoError> {
        let bind_err = |source| EchoError::Bind {
            addr: addr.to_string(),
            source,
        };

        let resolved = addr
            .to_socket_addrs()
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| bind_err(io::Error::new(io::ErrorKind::InvalidInput, "no address")))?;

        let inner = create_listener(resolved).map_err(bind_err)?;
        let addr = inner.local_addr().map_err(bind_err)?;
        Ok(Self { inner, addr })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept the single inbound connection.
    ///
    /// Consumes the listener; the listening socket is closed once this
    /// returns, so no second client can ever be accepted.
    pub fn accept(self) -> Result<(TcpStream, SocketAddr), EchoError> {
        let (stream, peer) = self.inner.accept().map_err(EchoError::Accept)?;
        Ok((stream, peer))
    }
}

fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;

    Ok(socket.into())
}

/// How a session's read loop ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Orderly close by the peer.
    PeerClosed,
    ReadFailed(io::Error),
    WriteFailed(io::Error),
}

/// Summary of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub peer: Option<SocketAddr>,
    /// Read events processed (each one acknowledged or failed on write).
    pub chunks: usize,
    pub bytes_received: usize,
    pub bytes_staged: usize,
    pub bytes_dropped: usize,
    pub acks_sent: usize,
    /// Ring size when the session closed.
    pub buffered: usize,
    pub end: SessionEnd,
}

impl SessionReport {
    /// Turn a transport failure into an error, keeping clean closes as `Ok`.
    pub fn into_result(self) -> Result<Self, EchoError> {
        match self.end {
            SessionEnd::PeerClosed => Ok(self),
            SessionEnd::ReadFailed(e) => Err(EchoError::Read(e)),
            SessionEnd::WriteFailed(e) => Err(EchoError::Write(e)),
        }
    }
}

/// One accepted connection and the ring that stages its bytes.
pub struct Session<S> {
    stream: S,
    peer: Option<SocketAddr>,
    ring: RingBuffer,
    chunk_size: usize,
    ack: Bytes,
}

impl<S: Read + Write> Session<S> {
    pub fn new(stream: S, ring: RingBuffer, chunk_size: usize, ack: Bytes) -> Self {
        Self {
            stream,
            peer: None,
            ring,
            chunk_size,
            ack,
        }
    }

    /// Tag the session with the remote address for reporting.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Run the read, stage, acknowledge loop until the peer closes or I/O fails.
    pub fn run(mut self) -> SessionReport {
        let mut buf = BytesMut::zeroed(self.chunk_size);
        let mut report = SessionReport {
            peer: self.peer,
            chunks: 0,
            bytes_received: 0,
            bytes_staged: 0,
            bytes_dropped: 0,
            acks_sent: 0,
            buffered: 0,
            end: SessionEnd::PeerClosed,
        };

        report.end = loop {
            let n = match self.stream.read(&mut buf) {
                Ok(0) => {
                    info!("Connection closed by client");
                    break SessionEnd::PeerClosed;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "Error reading from socket");
                    break SessionEnd::ReadFailed(e);
                }
            };

            let chunk = &buf[..n];
            let staged = self.ring.extend(chunk);
            report.chunks += 1;
            report.bytes_received += n;
            report.bytes_staged += staged;
            report.bytes_dropped += n - staged;

            if staged < n {
                warn!(dropped = n - staged, buffered = self.ring.size(), "Ring full, bytes dropped");
            }
            info!(
                len = n,
                data = %String::from_utf8_lossy(chunk),
                "Received data from client"
            );

            if let Err(e) = self.stream.write_all(&self.ack) {
                error!(error = %e, "Error writing acknowledgment");
                break SessionEnd::WriteFailed(e);
            }
            report.acks_sent += 1;
            debug!(buffered = self.ring.size(), "Sent acknowledgment to client");
        };

        report.buffered = self.ring.size();
        report
    }
}

/// Bind, accept one client, serve it, and return the session summary.
pub fn run(settings: &ServerSettings) -> Result<SessionReport, EchoError> {
    let listener = Listener::bind(&settings.listen)?;
    info!(address = %listener.local_addr(), "Server started, waiting for connection");
    serve_one(listener, settings)
}

/// Accept the single connection on an already-bound listener and serve it.
pub fn serve_one(listener: Listener, settings: &ServerSettings) -> Result<SessionReport, EchoError> {
    let (stream, peer) = listener.accept()?;
    info!(peer = %peer, "Client connected");

    let ring = RingBuffer::new(settings.capacity)?;
    let report = Session::new(stream, ring, settings.chunk_size, settings.ack.clone())
        .with_peer(peer)
        .run();

    info!(
        peer = %peer,
        chunks = report.chunks,
        staged = report.bytes_staged,
        dropped = report.bytes_dropped,
        "Session finished"
    );
    Ok(report)
}
