use std::collections::{HashMap, VecDeque};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use duet::{InputEvent, InputSource, KeyId, RenderFrame, Renderer};

use crate::keymap;
use crate::view;

/// Raw mode plus alternate screen for as long as it lives.
pub struct TerminalGuard {
    key_release: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut guard = Self { key_release: false };

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.key_release = true;
        }

        Ok(guard)
    }

    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.key_release {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }
}

/// Key edges from the terminal.
///
/// Terminals without the keyboard enhancement protocol only report presses
/// (repeated while held). In that case a key counts as released once no
/// press arrived for `release_after`.
pub struct TerminalInput {
    pending: VecDeque<InputEvent>,
    held: HashMap<KeyId, Instant>,
    release_after: Option<Duration>,
}

impl TerminalInput {
    pub fn new(release_after: Option<Duration>) -> Self {
        Self {
            pending: VecDeque::new(),
            held: HashMap::new(),
            release_after,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if keymap::is_close(&key) && key.kind != KeyEventKind::Release {
            self.pending.push_back(InputEvent::Close);
            return;
        }

        let Some(id) = keymap::key_id(key.code) else {
            return;
        };

        match (key.kind, self.release_after) {
            (KeyEventKind::Release, _) => {
                self.held.remove(&id);
                self.pending.push_back(InputEvent::KeyUp(id));
            }
            (KeyEventKind::Press, None) => self.pending.push_back(InputEvent::KeyDown(id)),
            (KeyEventKind::Repeat, None) => {}
            (KeyEventKind::Press | KeyEventKind::Repeat, Some(_)) => {
                if self.held.insert(id, now).is_none() {
                    self.pending.push_back(InputEvent::KeyDown(id));
                }
            }
        }
    }

    fn expire_held(&mut self, now: Instant) {
        let Some(release_after) = self.release_after else {
            return;
        };

        let mut expired: Vec<KeyId> = self
            .held
            .iter()
            .filter(|(_, last)| now.duration_since(**last) >= release_after)
            .map(|(key, _)| *key)
            .collect();
        expired.sort();

        for key in expired {
            self.held.remove(&key);
            self.pending.push_back(InputEvent::KeyUp(key));
        }
    }
}

impl InputSource for TerminalInput {
    fn poll_event(&mut self) -> io::Result<Option<InputEvent>> {
        while self.pending.is_empty() && event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key, Instant::now());
            }
        }

        if self.pending.is_empty() {
            self.expire_held(Instant::now());
        }

        Ok(self.pending.pop_front())
    }
}

pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Renderer for TerminalRenderer {
    fn publish(&mut self, frame: &RenderFrame) -> io::Result<()> {
        self.terminal.draw(|f| view::render(f, frame))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn drain(input: &mut TerminalInput) -> Vec<InputEvent> {
        input.pending.drain(..).collect()
    }

    #[test]
    fn reported_releases_pass_through() {
        let mut input = TerminalInput::new(None);
        let now = Instant::now();

        input.handle_key(key(KeyCode::Up, KeyEventKind::Press), now);
        input.handle_key(key(KeyCode::Up, KeyEventKind::Repeat), now);
        input.handle_key(key(KeyCode::Up, KeyEventKind::Release), now);

        assert_eq!(
            drain(&mut input),
            vec![InputEvent::KeyDown(KeyId::UP), InputEvent::KeyUp(KeyId::UP)]
        );
    }

    #[test]
    fn repeated_presses_hold_the_key() {
        let window = Duration::from_millis(500);
        let mut input = TerminalInput::new(Some(window));
        let start = Instant::now();

        input.handle_key(key(KeyCode::Left, KeyEventKind::Press), start);
        input.handle_key(key(KeyCode::Left, KeyEventKind::Press), start + window / 2);
        input.expire_held(start + window);

        assert_eq!(drain(&mut input), vec![InputEvent::KeyDown(KeyId::LEFT)]);

        input.expire_held(start + window * 2);
        assert_eq!(drain(&mut input), vec![InputEvent::KeyUp(KeyId::LEFT)]);
    }

    #[test]
    fn escape_closes() {
        let mut input = TerminalInput::new(None);
        input.handle_key(key(KeyCode::Esc, KeyEventKind::Press), Instant::now());
        assert_eq!(drain(&mut input), vec![InputEvent::Close]);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut input = TerminalInput::new(None);
        input.handle_key(key(KeyCode::F(5), KeyEventKind::Press), Instant::now());
        assert!(drain(&mut input).is_empty());
    }
}
