//! Scripted TCP client for the echo server.
//!
//! Sends each message in order, blocks for one acknowledgment read after
//! every send, then pauses before the next message. The first failure
//! aborts the sequence; there is no reconnect or retry.

use crate::config::ClientSettings;
use crate::error::EchoError;
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Summary of a completed scripted run.
#[derive(Debug, Default)]
pub struct ClientReport {
    /// Messages written to the server.
    pub sent: usize,
    /// Raw acknowledgment bytes, one entry per message.
    pub acknowledgments: Vec<Bytes>,
}

/// A connected client owning its socket.
pub struct EchoClient {
    stream: TcpStream,
    response_size: usize,
}

impl EchoClient {
    /// Connect to `addr`.
    ///
    /// `connect_timeout` bounds connection setup; `read_timeout` bounds each
    /// acknowledgment read. `None` keeps the blocking OS behavior.
    pub fn connect(
        addr: &str,
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
    ) -> Result<Self, EchoError> {
        let connect_err = |source| EchoError::Connect {
            addr: addr.to_string(),
            source,
        };

        let stream = match connect_timeout {
            None => TcpStream::connect(addr).map_err(connect_err)?,
            Some(timeout) => {
                let resolved: SocketAddr = addr
                    .to_socket_addrs()
                    .map_err(connect_err)?
                    .next()
                    .ok_or_else(|| {
                        connect_err(io::Error::new(io::ErrorKind::InvalidInput, "no address"))
                    })?;
                TcpStream::connect_timeout(&resolved, timeout).map_err(connect_err)?
            }
        };

        stream.set_read_timeout(read_timeout).map_err(connect_err)?;

        Ok(Self {
            stream,
            response_size: crate::protocol::CHUNK_SIZE,
        })
    }

    /// Override the maximum bytes taken per acknowledgment read.
    pub fn with_response_size(mut self, size: usize) -> Self {
        self.response_size = size;
        self
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Send one payload and wait for a single acknowledgment read.
    pub fn exchange(&mut self, payload: &[u8]) -> Result<Bytes, EchoError> {
        self.stream.write_all(payload).map_err(EchoError::Write)?;

        let mut buf = BytesMut::zeroed(self.response_size);
        let n = loop {
            match self.stream.read(&mut buf) {
                Ok(0) => return Err(EchoError::ConnectionClosed),
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(EchoError::Read(e)),
            }
        };

        buf.truncate(n);
        Ok(buf.freeze())
    }

    /// Send every message in order, pausing `pace` after each acknowledgment.
    pub fn run_script<S: AsRef<str>>(
        &mut self,
        messages: &[S],
        pace: Duration,
    ) -> Result<ClientReport, EchoError> {
        let mut report = ClientReport::default();

        for message in messages {
            let message = message.as_ref();
            let ack = self.exchange(message.as_bytes())?;
            report.sent += 1;
            info!(msg = message, "Sent");
            info!(
                ack = %String::from_utf8_lossy(&ack),
                "Received acknowledgment from server"
            );
            report.acknowledgments.push(ack);

            if !pace.is_zero() {
                debug!(pace_ms = pace.as_millis() as u64, "Pausing before next message");
                thread::sleep(pace);
            }
        }

        Ok(report)
    }

    /// Shut the connection down in both directions and release the socket.
    pub fn close(self) -> Result<(), EchoError> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(EchoError::Write(e)),
        }
    }
}

/// Connect, run the configured script, and close.
pub fn run(settings: &ClientSettings) -> Result<ClientReport, EchoError> {
    let mut client = EchoClient::connect(
        &settings.connect,
        settings.connect_timeout,
        settings.read_timeout,
    )?
    .with_response_size(settings.response_size);
    info!(address = %settings.connect, "Connected to the server");

    let report = client.run_script(&settings.messages, settings.pace)?;

    client.close()?;
    info!(sent = report.sent, "Connection closed");
    Ok(report)
}
