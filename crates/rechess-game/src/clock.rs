//! Per-side countdown timers with a one-second resolution.

use rechess_core::Color;
use tracing::{debug, info};

/// Render `seconds` as `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn format_time(seconds: u64) -> String {
    let (hours, rest) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// One side's countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    remaining: u64,
    base: u64,
    increment: u64,
    running: bool,
    expired: bool,
}

impl Timer {
    /// A stopped timer holding `base` seconds.
    pub fn new(base: u64, increment: u64) -> Self {
        Self {
            remaining: base,
            base,
            increment,
            running: false,
            expired: false,
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Return `true` while counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Count down one second. Returns `true` on the tick that reaches zero.
    fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return false;
        }
        self.running = false;
        !std::mem::replace(&mut self.expired, true)
    }

    fn add_increment(&mut self) {
        self.remaining += self.increment;
        if self.remaining > 0 {
            self.expired = false;
        }
    }

    fn reset(&mut self) {
        self.remaining = self.base;
        self.expired = false;
    }
}

/// A chess clock: one timer per side.
///
/// Starting one side never stops the other; the caller sequences them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    white: Timer,
    black: Timer,
}

impl Clock {
    /// Both sides stopped at `base` seconds, gaining `increment` per move.
    pub fn new(base: u64, increment: u64) -> Self {
        Self {
            white: Timer::new(base, increment),
            black: Timer::new(base, increment),
        }
    }

    /// The timer of `side`.
    pub fn timer(&self, side: Color) -> &Timer {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn timer_mut(&mut self, side: Color) -> &mut Timer {
        match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn start(&mut self, side: Color) {
        debug!(?side, "clock started");
        self.timer_mut(side).running = true;
    }

    pub fn stop(&mut self, side: Color) {
        self.timer_mut(side).running = false;
    }

    pub fn stop_all(&mut self) {
        self.white.running = false;
        self.black.running = false;
    }

    /// Count down one second for `side`. Returns `true` once when time runs out.
    pub fn tick(&mut self, side: Color) -> bool {
        let expired = self.timer_mut(side).tick();
        if expired {
            info!(?side, "time expired");
        }
        expired
    }

    /// Credit `side` with its increment after it completed a move.
    pub fn add_increment(&mut self, side: Color) {
        self.timer_mut(side).add_increment();
    }

    /// Restore `side` to the base time.
    pub fn reset(&mut self, side: Color) {
        self.timer_mut(side).reset();
    }

    pub fn reset_all(&mut self) {
        self.white.reset();
        self.black.reset();
    }

    /// Seconds left for `side`.
    pub fn remaining(&self, side: Color) -> u64 {
        self.timer(side).remaining
    }

    /// The side whose timer is running, White first if both are.
    pub fn running(&self) -> Option<Color> {
        if self.white.running {
            Some(Color::White)
        } else if self.black.running {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Replace base time and increment. Remaining time is kept until a reset.
    pub fn reconfigure(&mut self, base: u64, increment: u64) {
        for timer in [&mut self.white, &mut self.black] {
            timer.base = base;
            timer.increment = increment;
        }
    }
}
