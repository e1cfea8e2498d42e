use std::time::{Duration, Instant};

/// Monotonic elapsed-time source for the frame loop.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the clock started.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Frame time tracker for instrumentation.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn record_secs(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.record(Duration::from_secs_f64(seconds));
        }
    }

    fn samples(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let samples = self.samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Frames per second implied by the average frame time.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = Clock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
    }

    #[test]
    fn frame_timer_wraps_around() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30)); // overwrites first

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn fps_from_average() {
        let mut timer = FrameTimer::new(4);
        assert_eq!(timer.fps(), 0.0);
        timer.record_secs(0.02);
        timer.record_secs(0.02);
        assert!((timer.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn record_secs_ignores_garbage() {
        let mut timer = FrameTimer::new(4);
        timer.record_secs(-1.0);
        timer.record_secs(f64::NAN);
        assert_eq!(timer.count(), 0);
    }
}
