//! Idle accrual clock
//!
//! Credits passive income in whole-second units only. The credited instant
//! advances by exactly the credited seconds, so sub-second remainders carry
//! into the next poll instead of being lost. Gaps of any length (e.g. a tab
//! backgrounded for hours) are credited in full.

/// Tracks the last instant passive income was credited up to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccrualClock {
    credited_ms: f64,
}

impl AccrualClock {
    /// Start a clock anchored at the given wall-clock time (ms)
    pub fn new(now_ms: f64) -> Self {
        Self { credited_ms: now_ms }
    }

    /// Return the whole seconds elapsed since the last credit and advance
    /// the clock by exactly that many seconds. Returns 0 when less than a
    /// second has passed. A wall clock that moved backwards re-anchors the
    /// clock and credits nothing.
    pub fn poll(&mut self, now_ms: f64) -> u64 {
        if now_ms < self.credited_ms {
            self.credited_ms = now_ms;
            return 0;
        }
        let elapsed_ms = now_ms - self.credited_ms;
        if elapsed_ms < 1000.0 {
            return 0;
        }
        let whole_seconds = (elapsed_ms / 1000.0).floor() as u64;
        self.credited_ms += (whole_seconds * 1000) as f64;
        whole_seconds
    }

    /// The instant this clock has credited up to (ms)
    pub fn credited_ms(&self) -> f64 {
        self.credited_ms
    }
}
