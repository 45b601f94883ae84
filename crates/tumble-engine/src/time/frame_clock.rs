use std::time::{Duration, Instant};

/// Frame timing snapshot handed to the per-frame callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the clock's origin. Never decreases between ticks.
    pub timestamp_ms: f64,
}

/// Produces `FrameTime` snapshots relative to a fixed origin.
///
/// Intervals between ticks are not clamped; consumers derive their own deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(origin: Instant) -> Self {
        Self {
            origin,
            last_ms: 0.0,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let elapsed: Duration = now.saturating_duration_since(self.origin);
        let ms = (elapsed.as_secs_f64() * 1000.0).max(self.last_ms);
        self.last_ms = ms;

        FrameTime { timestamp_ms: ms }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_relative_to_origin() {
        let origin = Instant::now();
        let mut clock = FrameClock::starting_at(origin);

        let ft = clock.tick_at(origin + Duration::from_millis(250));
        assert!((ft.timestamp_ms - 250.0).abs() < 1e-6);
    }

    #[test]
    fn timestamps_never_decrease() {
        let origin = Instant::now();
        let mut clock = FrameClock::starting_at(origin);

        let later = clock.tick_at(origin + Duration::from_millis(40));
        // An instant before the previous tick must not move time backwards.
        let earlier = clock.tick_at(origin + Duration::from_millis(10));
        assert!(earlier.timestamp_ms >= later.timestamp_ms);
    }
}
