use std::collections::VecDeque;
use std::time::Instant;

use lightfield_kernel::SceneConfig;

/// Longest frame step the driver will feed the simulation, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Source of per-frame delta time, in seconds.
pub trait FrameClock {
    fn delta(&mut self) -> f32;
}

/// Wall clock. The first call returns zero.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for SystemClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

/// Scripted clock: replays queued deltas, then repeats `fallback`.
#[derive(Debug, Clone)]
pub struct ManualClock {
    queued: VecDeque<f32>,
    fallback: f32,
}

impl ManualClock {
    /// Every frame takes `dt`.
    pub fn fixed(dt: f32) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: dt,
        }
    }

    /// Replay `deltas` in order, then zero.
    pub fn scripted(deltas: impl IntoIterator<Item = f32>) -> Self {
        Self {
            queued: deltas.into_iter().collect(),
            fallback: 0.0,
        }
    }

    pub fn push(&mut self, dt: f32) {
        self.queued.push_back(dt);
    }
}

impl FrameClock for ManualClock {
    fn delta(&mut self) -> f32 {
        self.queued.pop_front().unwrap_or(self.fallback)
    }
}

/// Decides whether another frame runs. May adjust configuration between
/// frames, the way an external control surface would.
pub trait FrameSource {
    fn next_frame(&mut self, frame: u64, config: &mut SceneConfig) -> bool;
}

/// Runs a fixed number of frames.
#[derive(Debug, Clone, Copy)]
pub struct FixedFrames(pub u64);

impl FrameSource for FixedFrames {
    fn next_frame(&mut self, frame: u64, _config: &mut SceneConfig) -> bool {
        frame < self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_replays_then_falls_back() {
        let mut clock = ManualClock::scripted([0.016, 0.032]);
        assert_eq!(clock.delta(), 0.016);
        assert_eq!(clock.delta(), 0.032);
        assert_eq!(clock.delta(), 0.0);

        let mut fixed = ManualClock::fixed(0.02);
        fixed.push(0.5);
        assert_eq!(fixed.delta(), 0.5);
        assert_eq!(fixed.delta(), 0.02);
        assert_eq!(fixed.delta(), 0.02);
    }

    #[test]
    fn system_clock_starts_at_zero() {
        let mut clock = SystemClock::new();
        assert_eq!(clock.delta(), 0.0);
        assert!(clock.delta() >= 0.0);
    }

    #[test]
    fn fixed_frames_stops_at_count() {
        let mut config = SceneConfig::default();
        let mut frames = FixedFrames(2);
        assert!(frames.next_frame(0, &mut config));
        assert!(frames.next_frame(1, &mut config));
        assert!(!frames.next_frame(2, &mut config));
    }
}
