use std::time::Duration;

use tokio::time::Instant;

/// Elapsed playing time of the current track, excluding paused spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    started_at: Instant,
    accumulated: Duration,
    paused: bool,
}

impl PlaybackClock {
    /// A running clock at zero.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            accumulated: Duration::ZERO,
            paused: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed(&self) -> Duration {
        if self.paused {
            self.accumulated
        } else {
            self.accumulated + self.started_at.elapsed()
        }
    }

    /// Freezes the clock. Returns false (and changes nothing) if already paused.
    pub fn pause(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.accumulated += self.started_at.elapsed();
        self.paused = true;
        true
    }

    /// Restarts a paused clock. Returns false (and changes nothing) if running.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.started_at = Instant::now();
        self.paused = false;
        true
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
