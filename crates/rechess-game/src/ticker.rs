//! Background thread that feeds one-second ticks into the event channel.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::event::Event;

/// Interval between [`Event::Tick`]s.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Send [`Event::Tick`] every `interval` until the receiver is gone.
///
/// Ticks are scheduled against a fixed start time, so a slow send does not
/// make the clock drift.
pub fn spawn_ticker(events: Sender<Event>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        let start = Instant::now();
        let mut ticks: u32 = 0;
        loop {
            ticks += 1;
            let due = start + interval * ticks;
            thread::sleep(due.saturating_duration_since(Instant::now()));
            if events.send(Event::Tick).is_err() {
                debug!(ticks, "ticker stopped");
                break;
            }
        }
    })
}
