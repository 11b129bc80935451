//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over a channel.  A `Tick` goes out once per frame even while
//! input keeps arriving, so running animations never starve behind a fast
//! stream of wheel events.

use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

/// Roughly one display refresh.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
}

/// Spawns a background task that polls the terminal for events and sends them
/// through the returned channel, interleaved with frame ticks.
pub fn spawn_event_reader(frame: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut next_tick = Instant::now() + frame;
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            if event::poll(wait).unwrap_or(false) {
                if let Ok(ev) = event::read() {
                    let app_event = match ev {
                        // Key repeat and release events would double-step pages.
                        CtEvent::Key(k) if k.kind == KeyEventKind::Press => Some(AppEvent::Key(k)),
                        CtEvent::Mouse(m) => Some(AppEvent::Mouse(m)),
                        CtEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
                        _ => None,
                    };
                    if let Some(app_event) = app_event {
                        if tx.send(app_event).is_err() {
                            break; // receiver dropped
                        }
                    }
                }
            }

            let now = Instant::now();
            if now >= next_tick {
                if tx.send(AppEvent::Tick).is_err() {
                    break;
                }
                next_tick = now + frame;
            }
        }
    });

    rx
}
