use std::time::Duration;

/// Simulation frames per second for windowed runs.
pub const TARGET_FPS: u32 = 60;

/// Fixed-timestep accumulator: turns elapsed wall time into a whole number
/// of simulation frames at a fixed rate.
///
/// Elapsed time per call is clamped, so a stall (window drag, debugger)
/// costs at most `max_catch_up` frames instead of a burst.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_catch_up: u32,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(TARGET_FPS)
    }
}

impl FixedStep {
    /// Pacing at `fps` frames per second, catching up at most 5 frames.
    pub fn new(fps: u32) -> Self {
        Self {
            step: Duration::from_secs(1) / fps.max(1),
            accumulator: Duration::ZERO,
            max_catch_up: 5,
        }
    }

    pub fn with_max_catch_up(mut self, frames: u32) -> Self {
        self.max_catch_up = frames.max(1);
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add `elapsed` wall time and return how many frames are due now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let cap = self.step * self.max_catch_up;
        self.accumulator += elapsed.min(cap);
        let mut due = 0;
        while self.accumulator >= self.step && due < self.max_catch_up {
            self.accumulator -= self.step;
            due += 1;
        }
        due
    }

    /// Wall time left until the next frame is due.
    pub fn until_next(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_hz_by_default() {
        let pacing = FixedStep::default();
        assert_eq!(pacing.step(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn fast_redraws_do_not_speed_up_the_simulation() {
        // A 240 Hz display for one second still yields 60 frames.
        let mut pacing = FixedStep::new(60);
        let frames: u32 = (0..240)
            .map(|_| pacing.advance(Duration::from_secs(1) / 240))
            .sum();
        assert!((59..=60).contains(&frames), "got {frames}");
    }

    #[test]
    fn slow_redraws_catch_up() {
        // A 30 Hz display runs two frames per redraw.
        let mut pacing = FixedStep::new(60);
        let frames: u32 = (0..30)
            .map(|_| pacing.advance(Duration::from_secs(1) / 30))
            .sum();
        assert!((59..=60).contains(&frames), "got {frames}");
    }

    #[test]
    fn stalls_are_clamped() {
        let mut pacing = FixedStep::new(60).with_max_catch_up(3);
        assert_eq!(pacing.advance(Duration::from_secs(10)), 3);
        assert!(pacing.advance(Duration::ZERO) <= 3);
    }

    #[test]
    fn until_next_counts_down() {
        let mut pacing = FixedStep::new(10);
        assert_eq!(pacing.until_next(), Duration::from_millis(100));
        assert_eq!(pacing.advance(Duration::from_millis(40)), 0);
        assert_eq!(pacing.until_next(), Duration::from_millis(60));
    }
}
