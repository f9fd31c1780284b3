use std::io;

use super::keys::KeyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyId),
    KeyUp(KeyId),
    /// The window (or terminal) asked to close.
    Close,
}

/// Source of edge-triggered input. Implemented by the frontend.
pub trait InputSource {
    /// Returns the next pending event without blocking, or `None` when the
    /// queue is empty.
    fn poll_event(&mut self) -> io::Result<Option<InputEvent>>;
}
