use std::time::Duration;

use crate::net::{
    DEFAULT_BIND_HOST, DEFAULT_PEER_HOST, DEFAULT_PORT, DEFAULT_RECEIVE_TIMEOUT, Encoding,
    SetupError,
};
use crate::role::Role;

pub const DEFAULT_FRAME_RATE: u32 = 60;

#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Host the authority listens on.
    pub bind_host: String,
    /// Host the initiator connects to.
    pub peer_host: String,
    pub port: u16,
    pub receive_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            peer_host: DEFAULT_PEER_HOST.to_string(),
            port: DEFAULT_PORT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }
}

impl LinkConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn connect_addr(&self) -> String {
        format!("{}:{}", self.peer_host, self.port)
    }
}

/// Where inbound records are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiveMode {
    /// Bounded-wait reads on the frame loop.
    #[default]
    Inline,
    /// Blocking reads on a dedicated thread. Position encoding only.
    Background,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub role: Role,
    pub encoding: Encoding,
    pub receive_mode: ReceiveMode,
    /// Minimum wall time per tick. Zero disables pacing.
    pub frame_interval: Duration,
    pub link: LinkConfig,
}

impl SessionConfig {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            encoding: Encoding::KeyState,
            receive_mode: ReceiveMode::Inline,
            frame_interval: Duration::from_secs_f64(1.0 / DEFAULT_FRAME_RATE as f64),
            link: LinkConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.receive_mode == ReceiveMode::Background && self.encoding != Encoding::Position {
            return Err(SetupError::Config(
                "background receive requires the position encoding".into(),
            ));
        }

        if self.link.receive_timeout.is_zero() {
            return Err(SetupError::Config("receive timeout must be non-zero".into()));
        }

        Ok(())
    }
}
