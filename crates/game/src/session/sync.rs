use std::io;
use std::thread;
use std::time::Instant;

use super::Session;
use crate::input::{InputEvent, InputSource};
use crate::net::LinkError;
use crate::render::Renderer;

/// Why a session ended without a frontend failure.
#[derive(Debug)]
pub enum ExitReason {
    /// The input source asked to close.
    Closed,
    /// The link failed mid-session.
    LinkLost(LinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("frontend I/O failed: {0}")]
    Frontend(#[from] io::Error),
}

/// Frame loop. Each iteration either dispatches one pending input event or,
/// when none is pending, runs one tick and publishes the result.
pub struct SyncLoop<I, R> {
    session: Session,
    input: I,
    renderer: R,
}

impl<I, R> SyncLoop<I, R>
where
    I: InputSource,
    R: Renderer,
{
    pub fn new(session: Session, input: I, renderer: R) -> Self {
        Self {
            session,
            input,
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_parts(self) -> (Session, I, R) {
        (self.session, self.input, self.renderer)
    }

    /// One loop iteration. Returns the exit reason once the loop should stop.
    pub fn step(&mut self) -> Result<Option<ExitReason>, SessionError> {
        if let Some(event) = self.input.poll_event()? {
            return Ok(self.dispatch(event));
        }

        let started = Instant::now();

        let frame = match self.session.tick() {
            Ok(frame) => frame,
            Err(e) => return Ok(Some(ExitReason::LinkLost(e))),
        };
        self.renderer.publish(&frame)?;

        let interval = self.session.frame_interval();
        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            if !rest.is_zero() {
                thread::sleep(rest);
            }
        }

        Ok(None)
    }

    fn dispatch(&mut self, event: InputEvent) -> Option<ExitReason> {
        let sent = match event {
            InputEvent::Close => return Some(ExitReason::Closed),
            InputEvent::KeyDown(key) => self.session.on_key_down(key),
            InputEvent::KeyUp(key) => self.session.on_key_up(key),
        };

        match sent {
            Ok(changed) => {
                if changed {
                    log::trace!("{:?}", event);
                }
                None
            }
            Err(e) => Some(ExitReason::LinkLost(e)),
        }
    }

    /// Runs until the input closes or the link fails. The link is released
    /// on every exit path.
    pub fn run(&mut self) -> Result<ExitReason, SessionError> {
        let result = loop {
            match self.step() {
                Ok(Some(reason)) => break Ok(reason),
                Ok(None) => {}
                Err(e) => break Err(e),
            }
        };

        self.session.shutdown();

        match &result {
            Ok(ExitReason::Closed) => {
                log::info!("Closed after {} ticks", self.session.ticks());
            }
            Ok(ExitReason::LinkLost(e)) => {
                log::warn!("Link lost after {} ticks: {}", self.session.ticks(), e);
            }
            Err(e) => log::error!("Session aborted: {}", e),
        }

        result
    }
}
