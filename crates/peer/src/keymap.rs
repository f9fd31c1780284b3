use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use duet::KeyId;

/// Maps a terminal key to its 8-bit virtual-key id. Letters map to their
/// upper-case ASCII code regardless of shift.
pub fn key_id(code: KeyCode) -> Option<KeyId> {
    match code {
        KeyCode::Left => Some(KeyId::LEFT),
        KeyCode::Up => Some(KeyId::UP),
        KeyCode::Right => Some(KeyId::RIGHT),
        KeyCode::Down => Some(KeyId::DOWN),
        KeyCode::Enter => Some(KeyId::ENTER),
        KeyCode::Tab => Some(KeyId::TAB),
        KeyCode::Backspace => Some(KeyId::BACKSPACE),
        KeyCode::Char(' ') => Some(KeyId::SPACE),
        KeyCode::Char(c) if c.is_ascii_alphanumeric() => {
            Some(KeyId(c.to_ascii_uppercase() as u8))
        }
        _ => None,
    }
}

pub fn is_close(event: &KeyEvent) -> bool {
    match event.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
