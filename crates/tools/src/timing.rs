use std::time::{Duration, Instant};

/// Ring buffer of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    next: usize,
    len: usize,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            len: 0,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        let capacity = self.history.len();
        self.history[self.next] = dt;
        self.next = (self.next + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    fn recorded(&self) -> &[Duration] {
        &self.history[..self.len]
    }

    pub fn average(&self) -> Duration {
        if self.len == 0 {
            return Duration::ZERO;
        }
        self.recorded().iter().sum::<Duration>() / self.len as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.recorded().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.len = 0;
    }
}

/// Frames-per-second meter fed once per presented frame.
#[derive(Debug)]
pub struct PerformanceMeter {
    timer: FrameTimer,
    last: Option<Instant>,
    latest: Duration,
}

impl Default for PerformanceMeter {
    fn default() -> Self {
        Self::new(120)
    }
}

impl PerformanceMeter {
    /// `window` is the number of frames `average_fps` covers.
    pub fn new(window: usize) -> Self {
        Self {
            timer: FrameTimer::new(window),
            last: None,
            latest: Duration::ZERO,
        }
    }

    /// Mark a frame as presented now.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last.replace(now) {
            self.record(now - last);
        }
    }

    /// Record an explicit frame duration.
    pub fn record(&mut self, dt: Duration) {
        self.latest = dt;
        self.timer.record(dt);
    }

    /// Rate implied by the most recent frame.
    pub fn fps(&self) -> f32 {
        rate(self.latest)
    }

    /// Rate implied by the average over the window.
    pub fn average_fps(&self) -> f32 {
        rate(self.timer.average())
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Forget history, e.g. after measurement was switched back on.
    pub fn reset(&mut self) {
        self.timer.clear();
        self.last = None;
        self.latest = Duration::ZERO;
        tracing::debug!("performance meter reset");
    }
}

fn rate(dt: Duration) -> f32 {
    let secs = dt.as_secs_f32();
    if secs > 0.0 { 1.0 / secs } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.min(), Duration::from_millis(10));
    }

    #[test]
    fn frame_timer_wraps_around() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn empty_meter_reports_zero() {
        let meter = PerformanceMeter::new(10);
        assert_eq!(meter.fps(), 0.0);
        assert_eq!(meter.average_fps(), 0.0);
    }

    #[test]
    fn meter_reports_latest_and_average() {
        let mut meter = PerformanceMeter::new(4);
        meter.record(Duration::from_millis(20));
        meter.record(Duration::from_millis(10));
        assert!((meter.fps() - 100.0).abs() < 1e-3);
        assert!((meter.average_fps() - 1000.0 / 15.0).abs() < 1e-2);
    }

    #[test]
    fn reset_clears_history() {
        let mut meter = PerformanceMeter::new(4);
        meter.record(Duration::from_millis(16));
        meter.reset();
        assert_eq!(meter.timer().count(), 0);
        assert_eq!(meter.fps(), 0.0);
    }

    #[test]
    fn first_tick_records_nothing() {
        let mut meter = PerformanceMeter::new(4);
        meter.tick();
        assert_eq!(meter.timer().count(), 0);
    }
}
