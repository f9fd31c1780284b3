use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::protocol::{Encoding, MAX_RECORD_SIZE, Record};
use super::transport::{LinkError, SetupError, Transport, map_io};

type Delivery = Result<Record, LinkError>;

/// Reads records on a dedicated thread with blocking reads and hands them to
/// the frame loop over a channel, so network I/O never stalls a frame.
///
/// The thread owns a clone of the transport's socket. It exits once the
/// socket's read side is shut down, either by the transport or by dropping
/// the receiver.
#[derive(Debug)]
pub struct BackgroundReceiver {
    records: Option<Receiver<Delivery>>,
    handle: Option<JoinHandle<()>>,
    stream: TcpStream,
    record_size: usize,
    failure: Option<LinkError>,
}

impl BackgroundReceiver {
    pub fn spawn(transport: &Transport) -> Result<Self, SetupError> {
        let stream = transport
            .try_clone_stream()
            .map_err(SetupError::Configure)?;
        stream.set_read_timeout(None).map_err(SetupError::Configure)?;
        let reader = stream.try_clone().map_err(SetupError::Configure)?;

        let encoding = transport.encoding();
        let (tx, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("duet-recv".into())
            .spawn(move || receive_loop(reader, encoding, tx))
            .map_err(SetupError::Configure)?;

        log::debug!("Background receiver started for {}", transport.peer_addr());

        Ok(Self {
            records: Some(rx),
            handle: Some(handle),
            stream,
            record_size: encoding.record_size(),
            failure: None,
        })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Drains everything delivered so far. Only the newest record is kept;
    /// `count` says how many arrived. A failure that follows good records is
    /// held back and returned by the next call.
    pub fn latest(&mut self) -> Result<Drained, LinkError> {
        if let Some(e) = self.failure.take() {
            return Err(e);
        }
        let Some(records) = &self.records else {
            return Err(LinkError::Closed);
        };

        let mut drained = Drained::default();
        let failure = loop {
            match records.try_recv() {
                Ok(Ok(record)) => {
                    drained.count += 1;
                    drained.latest = Some(record);
                }
                Ok(Err(e)) => break e,
                Err(TryRecvError::Empty) => return Ok(drained),
                Err(TryRecvError::Disconnected) => break LinkError::Closed,
            }
        };

        if drained.count == 0 {
            return Err(failure);
        }
        self.failure = Some(failure);
        Ok(drained)
    }
}

#[derive(Debug, Default)]
pub struct Drained {
    pub latest: Option<Record>,
    pub count: usize,
}

impl Drop for BackgroundReceiver {
    fn drop(&mut self) {
        // Wakes the blocked read; the thread's next send then fails.
        if let Err(e) = self.stream.shutdown(Shutdown::Read) {
            if e.kind() != io::ErrorKind::NotConnected {
                log::warn!("Background receiver shutdown failed: {}", e);
            }
        }
        self.records.take();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Background receiver panicked");
            }
        }
    }
}

fn receive_loop(mut stream: TcpStream, encoding: Encoding, tx: Sender<Delivery>) {
    let size = encoding.record_size();
    let mut buffer = [0u8; MAX_RECORD_SIZE];

    loop {
        let delivery = match stream.read_exact(&mut buffer[..size]) {
            Ok(()) => Record::decode(encoding, &buffer[..size]).map_err(LinkError::from),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(map_io(e)),
        };

        let failed = delivery.is_err();
        if tx.send(delivery).is_err() || failed {
            break;
        }
    }

    log::debug!("Background receiver stopped");
}
