use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use super::protocol::{Encoding, MAX_RECORD_SIZE, Record, RecordError};
use super::stats::LinkStats;
use crate::role::Role;
use crate::session::LinkConfig;

/// Shortest wait handed to the socket; a zero read timeout is rejected by
/// the OS API.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Failure while bringing the link up. The session cannot start without it.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to accept peer: {0}")]
    Accept(#[source] io::Error),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to configure socket: {0}")]
    Configure(#[source] io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failure on an established link. Ends the session.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("peer closed the connection")]
    Closed,
    #[error("link I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt record: {0}")]
    Corrupt(#[from] RecordError),
}

#[derive(Debug, Clone, Copy)]
enum Wait {
    Until(Instant),
    NoWait,
}

/// The single byte stream to the peer, exchanging fixed-size records.
#[derive(Debug)]
pub struct Transport {
    stream: TcpStream,
    peer_addr: SocketAddr,
    encoding: Encoding,
    recv_buffer: [u8; MAX_RECORD_SIZE],
    filled: usize,
    read_timeout: Option<Duration>,
    stats: LinkStats,
    closed: bool,
}

impl Transport {
    pub fn establish(
        role: Role,
        config: &LinkConfig,
        encoding: Encoding,
    ) -> Result<Self, SetupError> {
        match role {
            Role::Authority => {
                let listener = Self::listen(config.listen_addr())?;
                Self::accept(listener, encoding)
            }
            Role::Initiator => Self::connect(config.connect_addr(), encoding),
        }
    }

    pub fn listen<A: ToSocketAddrs + ToString>(addr: A) -> Result<TcpListener, SetupError> {
        let listener = TcpListener::bind(&addr).map_err(|source| SetupError::Listen {
            addr: addr.to_string(),
            source,
        })?;

        if let Ok(local) = listener.local_addr() {
            log::info!("Listening on {}", local);
        }

        Ok(listener)
    }

    /// Accepts exactly one peer. The listener is dropped afterwards.
    pub fn accept(listener: TcpListener, encoding: Encoding) -> Result<Self, SetupError> {
        let (stream, addr) = listener.accept().map_err(SetupError::Accept)?;
        log::info!("Accepted peer {}", addr);
        Self::from_stream(stream, encoding)
    }

    pub fn connect<A: ToSocketAddrs + ToString>(
        addr: A,
        encoding: Encoding,
    ) -> Result<Self, SetupError> {
        log::info!("Connecting to {}", addr.to_string());
        let stream = TcpStream::connect(&addr).map_err(|source| SetupError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        Self::from_stream(stream, encoding)
    }

    pub fn from_stream(stream: TcpStream, encoding: Encoding) -> Result<Self, SetupError> {
        stream.set_nodelay(true).map_err(SetupError::Configure)?;
        let peer_addr = stream.peer_addr().map_err(SetupError::Configure)?;

        log::debug!(
            "Link to {} up, {} records of {} bytes",
            peer_addr,
            encoding.label(),
            encoding.record_size()
        );

        Ok(Self {
            stream,
            peer_addr,
            encoding,
            recv_buffer: [0u8; MAX_RECORD_SIZE],
            filled: 0,
            read_timeout: None,
            stats: LinkStats::default(),
            closed: false,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut LinkStats {
        &mut self.stats
    }

    pub(crate) fn try_clone_stream(&self) -> io::Result<TcpStream> {
        self.stream.try_clone()
    }

    pub fn send(&mut self, record: &Record) -> Result<(), LinkError> {
        if record.encoding() != self.encoding {
            return Err(RecordError::EncodingMismatch {
                expected: self.encoding,
                actual: record.encoding(),
            }
            .into());
        }

        let bytes = record.as_bytes();
        self.stream.write_all(bytes).map_err(map_io)?;
        self.stats.record_sent(bytes.len());

        log::trace!("Sent {} record to {}", self.encoding.label(), self.peer_addr);
        Ok(())
    }

    /// Waits up to `timeout` for one record. `Ok(None)` means nothing
    /// complete arrived in time; bytes of a partial record are kept for the
    /// next call.
    pub fn receive(&mut self, timeout: Duration) -> Result<Option<Record>, LinkError> {
        self.read_record(Wait::Until(Instant::now() + timeout))
    }

    /// Returns a record only if one is already fully buffered by the OS.
    pub fn try_receive(&mut self) -> Result<Option<Record>, LinkError> {
        self.stream.set_nonblocking(true)?;
        let result = self.read_record(Wait::NoWait);
        self.stream.set_nonblocking(false)?;
        result
    }

    fn read_record(&mut self, wait: Wait) -> Result<Option<Record>, LinkError> {
        let size = self.encoding.record_size();

        let mut first_read = true;

        while self.filled < size {
            if let Wait::Until(deadline) = wait {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() && !first_read {
                    self.stats.record_timeout();
                    return Ok(None);
                }
                self.set_read_timeout(remaining.max(MIN_READ_TIMEOUT))?;
            }
            first_read = false;

            match self.stream.read(&mut self.recv_buffer[self.filled..size]) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => self.filled += n,
                Err(e) if is_timeout(&e) => {
                    if let Wait::Until(_) = wait {
                        self.stats.record_timeout();
                    }
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io(e)),
            }
        }

        self.filled = 0;
        let record = Record::decode(self.encoding, &self.recv_buffer[..size])?;
        self.stats.record_received(size);

        log::trace!("Received {} record from {}", self.encoding.label(), self.peer_addr);
        Ok(Some(record))
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        if self.read_timeout != Some(timeout) {
            self.stream.set_read_timeout(Some(timeout))?;
            self.read_timeout = Some(timeout);
        }
        Ok(())
    }

    /// Shuts the stream down in both directions. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => log::debug!("Link to {} shut down", self.peer_addr),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
            Err(e) => log::warn!("Link shutdown failed: {}", e),
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

pub(crate) fn map_io(e: io::Error) -> LinkError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => LinkError::Closed,
        _ => LinkError::Io(e),
    }
}
