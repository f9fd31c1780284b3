use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use duet::{InputEvent, InputSource, PlayerPosition, RenderFrame, Renderer};

/// Ticks at 60 Hz, so this is roughly every ten seconds.
const STATS_INTERVAL_TICKS: u64 = 600;

/// No local keys. The peer's moves are still mirrored. Closes once
/// interrupted.
#[derive(Default)]
pub struct IdleInput {
    interrupted: Arc<AtomicBool>,
}

impl IdleInput {
    /// Turns Ctrl-C into a close request so the loop can release the link.
    pub fn watch_ctrl_c() -> io::Result<Self> {
        let input = Self::default();
        let interrupted = Arc::clone(&input.interrupted);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("duet-signal".into())
            .spawn(move || match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    log::info!("Interrupted, closing");
                    interrupted.store(true, Ordering::Release);
                }
                Err(e) => log::warn!("Ctrl-C handler failed: {}", e),
            })?;

        Ok(input)
    }
}

impl InputSource for IdleInput {
    fn poll_event(&mut self) -> io::Result<Option<InputEvent>> {
        if self.interrupted.load(Ordering::Acquire) {
            return Ok(Some(InputEvent::Close));
        }
        Ok(None)
    }
}

#[derive(Default)]
pub struct LogRenderer {
    last: Option<(PlayerPosition, PlayerPosition)>,
}

impl Renderer for LogRenderer {
    fn publish(&mut self, frame: &RenderFrame) -> io::Result<()> {
        let positions = (frame.authority, frame.initiator);
        if self.last != Some(positions) {
            log::debug!(
                "Tick {}: server ({:.3}, {:.3}) client ({:.3}, {:.3})",
                frame.tick,
                frame.authority.x(),
                frame.authority.y(),
                frame.initiator.x(),
                frame.initiator.y()
            );
            self.last = Some(positions);
        }

        if frame.tick % STATS_INTERVAL_TICKS == 0 {
            let stats = &frame.stats;
            log::info!(
                "Link: {} sent / {} recv records, {} timeouts",
                stats.records_sent,
                stats.records_received,
                stats.timeouts
            );
        }

        Ok(())
    }
}
