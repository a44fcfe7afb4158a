/// Time advanced per drawn frame at speed 1.0, tuned by eye for the grain overlay.
pub const NOISE_TIME_STEP: f64 = 0.005;

/// Accumulated noise time wraps here so the `f32` handed to shaders keeps
/// sub-step precision over long runs.
pub const NOISE_TIME_WRAP: f64 = 10_000.0;

/// Simulation-time accumulator for the noise overlay.
///
/// Advanced once per drawn frame (not per wall-clock second) so that
/// observations stay deterministic for a given frame sequence.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NoiseClock {
    elapsed: f64,
}

impl NoiseClock {
    pub const fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Current accumulated time in `[0, NOISE_TIME_WRAP)`.
    #[inline]
    pub fn elapsed(self) -> f64 {
        self.elapsed
    }

    /// Advances by one frame at `speed` and returns the new time as shader input.
    pub fn tick(&mut self, speed: f32) -> f32 {
        self.elapsed = (self.elapsed + NOISE_TIME_STEP * speed as f64).rem_euclid(NOISE_TIME_WRAP);
        self.elapsed as f32
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn advances_by_step_times_speed() {
        let mut clock = NoiseClock::new();
        for _ in 0..200 {
            clock.tick(2.5);
        }
        assert_relative_eq!(clock.elapsed(), 200.0 * 0.005 * 2.5, epsilon = 1e-9);
    }

    #[test]
    fn wraps_at_bound() {
        let mut clock = NoiseClock { elapsed: NOISE_TIME_WRAP - 0.001 };
        clock.tick(1.0);
        assert_relative_eq!(clock.elapsed(), 0.004, epsilon = 1e-9);
    }

    #[test]
    fn negative_speed_stays_in_range() {
        let mut clock = NoiseClock::new();
        clock.tick(-1.0);
        assert!(clock.elapsed() >= 0.0 && clock.elapsed() < NOISE_TIME_WRAP);
    }
}
