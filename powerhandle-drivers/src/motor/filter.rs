//! Encoder velocity filter
//!
//! Moving sum of encoder ticks over the last `taps` servo ticks. With a 1 ms
//! servo tick the armature speed is
//! `sum * 60_000 / (taps * ticks_per_rev)` RPM, so the speed resolution
//! depends on the filter size.

/// Largest supported filter size
pub const MAX_TAPS: usize = 32;

const HISTORY: usize = MAX_TAPS + 1;

/// Servo ticks per minute
const TICKS_PER_MINUTE: f32 = 60_000.0;

#[derive(Debug, Clone)]
pub struct VelocityFilter {
    history: [i32; HISTORY],
    head: usize,
    taps: usize,
}

impl VelocityFilter {
    pub const fn new() -> Self {
        Self {
            history: [0; HISTORY],
            head: 0,
            taps: 1,
        }
    }

    pub fn taps(&self) -> usize {
        self.taps
    }

    /// Change the window; history is kept
    pub fn set_taps(&mut self, taps: usize) {
        self.taps = taps.clamp(1, MAX_TAPS);
    }

    /// Restart at `position` with zero speed
    pub fn reset(&mut self, position: i32) {
        self.history = [position; HISTORY];
        self.head = 0;
    }

    /// Record a position sample; returns ticks moved over the window
    pub fn push(&mut self, position: i32) -> i32 {
        let oldest = self.history[(self.head + HISTORY - self.taps) % HISTORY];
        self.history[self.head] = position;
        self.head = (self.head + 1) % HISTORY;
        position.wrapping_sub(oldest)
    }

    /// Convert a window sum to armature RPM
    pub fn rpm(&self, window_ticks: i32, ticks_per_rev: u32) -> f32 {
        window_ticks as f32 * rpm_resolution(self.taps, ticks_per_rev)
    }
}

impl Default for VelocityFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Armature RPM represented by one tick in a `taps` window
pub fn rpm_resolution(taps: usize, ticks_per_rev: u32) -> f32 {
    TICKS_PER_MINUTE / (taps as f32 * ticks_per_rev as f32)
}
