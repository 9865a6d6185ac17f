//! Frame timing.

use std::time::Instant;

/// Wall-clock frame timer. [`FrameClock::tick`] returns seconds since the previous tick,
/// clamped to `max_dt` so a stall (breakpoint, dragged window) does not skip a step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    max_dt: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            max_dt: 0.1,
        }
    }

    #[inline]
    pub fn with_max_dt(mut self, max_dt: f32) -> Self {
        self.max_dt = max_dt.max(0.0);
        self
    }

    #[inline]
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last).as_secs_f32();
        self.last = now;
        dt.clamp(0.0, self.max_dt)
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
    fn tick_is_clamped() {
        let mut clock = FrameClock::new().with_max_dt(0.0);
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(clock.tick(), 0.0);
    }
}
