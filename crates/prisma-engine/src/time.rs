//! Frame timing.
//!
//! One clock per frame loop. Each tick yields the delta since the previous
//! tick plus the accumulated scene time; both are threaded explicitly into
//! the code that needs them (the components' `advance` calls, the
//! composite's time uniform). There is no ambient clock state anywhere else.

use std::time::Instant;

/// Delta handed out on the first tick and after [`FrameClock::reset`],
/// when no previous tick exists to measure against.
const FALLBACK_DT: f32 = 1.0 / 60.0;

/// Upper bound on a single tick's delta, in seconds.
///
/// A stall (debugger, minimized window, driver hiccup) must not turn into
/// one giant animation step: the scroll wrap relocates at most one line per
/// tick only while `speed * dt` stays far below the line spacing, and the
/// particle wrap makes the same assumption against its vertical band.
const MAX_DT: f32 = 0.1;

/// Timing snapshot for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, capped at [`MAX_DT`].
    pub dt: f32,
    /// Scene time: the sum of every delta handed out so far. Drives the
    /// composite's time uniform.
    pub elapsed: f32,
}

/// Produces [`FrameTime`] snapshots, one per presented frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    elapsed: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            elapsed: 0.0,
        }
    }

    /// Drops the baseline; the next tick gets the fallback delta.
    ///
    /// Called after surface reconfiguration so rebuild time is not charged
    /// to the animation.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Advances the clock and returns this frame's timing.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = match self.last {
            None => FALLBACK_DT,
            Some(prev) => now.duration_since(prev).as_secs_f32().min(MAX_DT),
        };

        self.last = Some(now);
        self.elapsed += dt;

        FrameTime {
            dt,
            elapsed: self.elapsed,
        }
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
    use std::time::Duration;

    #[test]
    fn first_tick_uses_the_fallback_delta() {
        let mut clock = FrameClock::new();
        let ft = clock.tick();
        assert_eq!(ft.dt, FALLBACK_DT);
        assert_eq!(ft.elapsed, FALLBACK_DT);
    }

    #[test]
    fn reset_rearms_the_fallback() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.reset();
        assert_eq!(clock.tick().dt, FALLBACK_DT);
    }

    #[test]
    fn a_stall_is_clamped_to_the_maximum_delta() {
        let mut clock = FrameClock::new();
        clock.tick();
        // Back-date the baseline to simulate a long stall.
        clock.last = Some(Instant::now() - Duration::from_secs(5));
        assert_eq!(clock.tick().dt, MAX_DT);
    }

    #[test]
    fn elapsed_accumulates_every_delta() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!((b.elapsed - (a.elapsed + b.dt)).abs() < 1e-6);
    }
}
