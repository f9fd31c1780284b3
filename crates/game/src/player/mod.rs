mod model;
mod position;

pub use model::{AUTHORITY_START, Directions, INITIATOR_START, MOVE_DELTA, PositionModel};
pub use position::{POSITION_MAX, POSITION_MIN, PlayerPosition};
