use std::time::Duration;

use bytemuck::{Pod, Zeroable};

pub const DEFAULT_PORT: u16 = 25565;
pub const DEFAULT_PEER_HOST: &str = "127.0.0.1";
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
/// Roughly one frame at 60 Hz.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(17);

pub const KEY_COUNT: usize = 256;
pub const KEY_RECORD_SIZE: usize = KEY_COUNT;
pub const POSITION_RECORD_SIZE: usize = std::mem::size_of::<PositionRecord>();
pub const MAX_RECORD_SIZE: usize = KEY_RECORD_SIZE;

/// Which record shape travels over the link. Both peers must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Whole local key table, pushed on every key change.
    KeyState,
    /// Sender's own position, pushed every tick.
    Position,
}

impl Encoding {
    pub fn record_size(self) -> usize {
        match self {
            Encoding::KeyState => KEY_RECORD_SIZE,
            Encoding::Position => POSITION_RECORD_SIZE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Encoding::KeyState => "key-state",
            Encoding::Position => "position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("expected a {expected}-byte record, got {actual} bytes")]
    Length { expected: usize, actual: usize },
    #[error("key {index:#04x} carries invalid state byte {value:#04x}")]
    InvalidKeyState { index: usize, value: u8 },
    #[error("position ({x}, {y}) is not finite")]
    NonFinite { x: f32, y: f32 },
    #[error("{actual:?} record on a {expected:?} link")]
    EncodingMismatch { expected: Encoding, actual: Encoding },
}

/// One byte per key: 0 released, 1 pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStateRecord([u8; KEY_RECORD_SIZE]);

impl Default for KeyStateRecord {
    fn default() -> Self {
        Self([0; KEY_RECORD_SIZE])
    }
}

impl KeyStateRecord {
    pub fn from_flags(flags: &[bool; KEY_COUNT]) -> Self {
        let mut bytes = [0u8; KEY_RECORD_SIZE];
        for (byte, &pressed) in bytes.iter_mut().zip(flags) {
            *byte = u8::from(pressed);
        }
        Self(bytes)
    }

    pub fn decode(data: &[u8]) -> Result<Self, RecordError> {
        let bytes: [u8; KEY_RECORD_SIZE] =
            data.try_into().map_err(|_| RecordError::Length {
                expected: KEY_RECORD_SIZE,
                actual: data.len(),
            })?;

        if let Some((index, &value)) = bytes.iter().enumerate().find(|(_, b)| **b > 1) {
            return Err(RecordError::InvalidKeyState { index, value });
        }

        Ok(Self(bytes))
    }

    #[inline]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.0[index] != 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Raw `(x, y)` pair in native float layout, the same bytes the player
/// position occupies in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PositionRecord {
    pub x: f32,
    pub y: f32,
}

impl PositionRecord {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn decode(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() != POSITION_RECORD_SIZE {
            return Err(RecordError::Length {
                expected: POSITION_RECORD_SIZE,
                actual: data.len(),
            });
        }

        let record: Self = bytemuck::pod_read_unaligned(data);
        if !record.x.is_finite() || !record.y.is_finite() {
            return Err(RecordError::NonFinite {
                x: record.x,
                y: record.y,
            });
        }

        Ok(record)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    KeyState(KeyStateRecord),
    Position(PositionRecord),
}

impl Record {
    pub fn encoding(&self) -> Encoding {
        match self {
            Record::KeyState(_) => Encoding::KeyState,
            Record::Position(_) => Encoding::Position,
        }
    }

    pub fn decode(encoding: Encoding, data: &[u8]) -> Result<Self, RecordError> {
        match encoding {
            Encoding::KeyState => KeyStateRecord::decode(data).map(Record::KeyState),
            Encoding::Position => PositionRecord::decode(data).map(Record::Position),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Record::KeyState(record) => record.as_bytes(),
            Record::Position(record) => record.as_bytes(),
        }
    }
}
