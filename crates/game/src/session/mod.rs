mod config;
mod sync;

use std::net::SocketAddr;
use std::time::Duration;

pub use config::{DEFAULT_FRAME_RATE, LinkConfig, ReceiveMode, SessionConfig};
pub use sync::{ExitReason, SessionError, SyncLoop};

use crate::input::{KeyId, KeyStateTable};
use crate::net::{BackgroundReceiver, Encoding, LinkError, LinkStats, Record, SetupError, Transport};
use crate::player::{PlayerPosition, PositionModel};
use crate::render::RenderFrame;
use crate::role::Role;

/// Everything one peer owns for the life of the link: the transport, both
/// key tables and both positions.
///
/// `local_keys` changes only through [`Session::on_key_down`] and
/// [`Session::on_key_up`]; `remote_keys` and the peer's position change only
/// through records from the link.
#[derive(Debug)]
pub struct Session {
    role: Role,
    encoding: Encoding,
    receive_timeout: Duration,
    frame_interval: Duration,
    transport: Transport,
    receiver: Option<BackgroundReceiver>,
    local_keys: KeyStateTable,
    remote_keys: KeyStateTable,
    model: PositionModel,
    tick: u64,
}

impl Session {
    /// Brings the link up for `config.role` and wraps it in a session.
    pub fn establish(config: &SessionConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let transport = Transport::establish(config.role, &config.link, config.encoding)?;
        Self::new(config, transport)
    }

    pub fn new(config: &SessionConfig, transport: Transport) -> Result<Self, SetupError> {
        config.validate()?;

        if transport.encoding() != config.encoding {
            return Err(SetupError::Config(format!(
                "transport carries {} records, session expects {}",
                transport.encoding().label(),
                config.encoding.label()
            )));
        }

        let receiver = match config.receive_mode {
            ReceiveMode::Background => Some(BackgroundReceiver::spawn(&transport)?),
            ReceiveMode::Inline => None,
        };

        log::info!(
            "{} session with {} ({} records, {:?} receive)",
            config.role.label(),
            transport.peer_addr(),
            config.encoding.label(),
            config.receive_mode
        );

        Ok(Self {
            role: config.role,
            encoding: config.encoding,
            receive_timeout: config.link.receive_timeout,
            frame_interval: config.frame_interval,
            transport,
            receiver,
            local_keys: KeyStateTable::new(),
            remote_keys: KeyStateTable::new(),
            model: PositionModel::default(),
            tick: 0,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.transport.peer_addr()
    }

    pub fn stats(&self) -> &LinkStats {
        self.transport.stats()
    }

    pub fn local_keys(&self) -> &KeyStateTable {
        &self.local_keys
    }

    pub fn remote_keys(&self) -> &KeyStateTable {
        &self.remote_keys
    }

    pub fn model(&self) -> &PositionModel {
        &self.model
    }

    pub fn own_position(&self) -> PlayerPosition {
        self.model.position(self.role)
    }

    pub fn peer_position(&self) -> PlayerPosition {
        self.model.position(self.role.peer())
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Returns whether the key changed. A change is pushed to the peer
    /// right away on a key-state link.
    pub fn on_key_down(&mut self, key: KeyId) -> Result<bool, LinkError> {
        self.set_local_key(key, true)
    }

    pub fn on_key_up(&mut self, key: KeyId) -> Result<bool, LinkError> {
        self.set_local_key(key, false)
    }

    fn set_local_key(&mut self, key: KeyId, pressed: bool) -> Result<bool, LinkError> {
        if !self.local_keys.set(key, pressed) {
            return Ok(false);
        }

        if self.encoding == Encoding::KeyState {
            let record = Record::KeyState(self.local_keys.to_record());
            self.transport.send(&record)?;
        }

        Ok(true)
    }

    /// Applies one inbound record. Key-state records replace `remote_keys`
    /// whole; position records replace the peer's position.
    pub fn apply_remote(&mut self, record: &Record) {
        match record {
            Record::KeyState(keys) => self.remote_keys.apply_record(keys),
            Record::Position(position) => self
                .model
                .set_position(self.role.peer(), PlayerPosition::from_record(position)),
        }
    }

    /// Newest record that arrived since the last poll, if any. Inline mode
    /// waits up to the receive timeout for the first one.
    pub fn poll_remote(&mut self) -> Result<Option<Record>, LinkError> {
        if let Some(receiver) = &mut self.receiver {
            let drained = receiver.latest()?;
            let stats = self.transport.stats_mut();
            for _ in 0..drained.count {
                stats.record_received(receiver.record_size());
            }
            return Ok(drained.latest);
        }

        let Some(mut latest) = self.transport.receive(self.receive_timeout)? else {
            return Ok(None);
        };
        loop {
            match self.transport.try_receive() {
                Ok(Some(record)) => latest = record,
                Ok(None) => break,
                // Still closed on the next poll; hand out what already arrived.
                Err(LinkError::Closed) => break,
                Err(e) => return Err(e),
            }
        }

        Ok(Some(latest))
    }

    /// One frame of the link: take in the peer's newest state, advance both
    /// players, and on a position link push our own position.
    pub fn tick(&mut self) -> Result<RenderFrame, LinkError> {
        if let Some(record) = self.poll_remote()? {
            self.apply_remote(&record);
        }

        self.model
            .tick(&self.local_keys, &self.remote_keys, self.role);

        if self.encoding == Encoding::Position {
            let own = Record::Position(self.own_position().to_record());
            self.transport.send(&own)?;
        }

        self.tick += 1;
        Ok(self.frame())
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            authority: self.model.authority(),
            initiator: self.model.initiator(),
            role: self.role,
            encoding: self.encoding,
            tick: self.tick,
            stats: *self.transport.stats(),
        }
    }

    /// Releases the link. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // The receiver thread is blocked on the shared socket until it closes.
        self.shutdown();
    }
}
