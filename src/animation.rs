//! Explicit timed interpolation.
//!
//! A [`Tween`] records when it started and how long it runs; callers sample it
//! with the current time. Nothing advances on its own. Owners cancel a tween by
//! dropping it.

/// A fixed-duration eased 0 → 1 animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    started_at: f64,
    duration: f64,
}

impl Tween {
    /// Starts a tween at `now` (seconds) lasting `duration` seconds.
    pub fn start(now: f64, duration: f64) -> Self {
        Self {
            started_at: now,
            duration: duration.max(0.0),
        }
    }

    /// Linear progress at `now`, clamped to `[0, 1]`.
    pub fn linear(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased progress at `now`.
    pub fn progress(&self, now: f64) -> f64 {
        ease_in_out(self.linear(now))
    }

    /// Returns true once the full duration has elapsed.
    pub fn is_finished(&self, now: f64) -> bool {
        self.linear(now) >= 1.0
    }
}

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
