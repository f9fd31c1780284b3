mod event;
mod keys;

pub use event::{InputEvent, InputSource};
pub use keys::{KeyId, KeyStateTable};
