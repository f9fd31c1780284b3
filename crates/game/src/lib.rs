pub mod input;
pub mod net;
pub mod player;
pub mod render;
pub mod role;
pub mod session;

pub use input::{InputEvent, InputSource, KeyId, KeyStateTable};
pub use net::{
    BackgroundReceiver, DEFAULT_PORT, DEFAULT_RECEIVE_TIMEOUT, Encoding, KeyStateRecord,
    LinkError, LinkStats, PositionRecord, Record, RecordError, SetupError, Transport,
};
pub use player::{Directions, MOVE_DELTA, PlayerPosition, PositionModel};
pub use render::{RenderFrame, Renderer};
pub use role::Role;
pub use session::{
    ExitReason, LinkConfig, ReceiveMode, Session, SessionConfig, SessionError, SyncLoop,
};
