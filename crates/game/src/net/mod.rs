mod protocol;
mod receiver;
mod stats;
mod transport;

pub use protocol::{
    DEFAULT_BIND_HOST, DEFAULT_PEER_HOST, DEFAULT_PORT, DEFAULT_RECEIVE_TIMEOUT, Encoding,
    KEY_COUNT, KEY_RECORD_SIZE, KeyStateRecord, MAX_RECORD_SIZE, POSITION_RECORD_SIZE,
    PositionRecord, Record, RecordError,
};
pub use receiver::{BackgroundReceiver, Drained};
pub use stats::LinkStats;
pub use transport::{LinkError, SetupError, Transport};
