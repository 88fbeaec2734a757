//! Frame timing.

use std::time::{Duration, Instant};

/// Measures the time elapsed between consecutive frames.
#[derive(Debug, Clone)]
pub struct DeltaTime {
    last_frame: Instant,
    delta: Duration,
    elapsed: Duration,
    frame: u64,
}

impl Default for DeltaTime {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaTime {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame: 0,
        }
    }

    /// Advance to a new frame, measuring against the wall clock.
    ///
    /// Returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.advance(now.duration_since(self.last_frame));
        self.last_frame = now;
        self.seconds()
    }

    /// Advance by an explicit duration. Headless runs and tests use this to
    /// get a deterministic clock.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame += 1;
    }

    /// Delta of the last frame in seconds.
    pub fn seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time since creation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut dt = DeltaTime::new();
        dt.advance(Duration::from_millis(16));
        dt.advance(Duration::from_millis(20));
        assert_eq!(dt.frame(), 2);
        assert!((dt.seconds() - 0.020).abs() < 1e-6);
        assert_eq!(dt.elapsed(), Duration::from_millis(36));
    }

    #[test]
    fn test_tick_is_non_negative() {
        let mut dt = DeltaTime::new();
        assert!(dt.tick() >= 0.0);
        assert_eq!(dt.frame(), 1);
    }
}
