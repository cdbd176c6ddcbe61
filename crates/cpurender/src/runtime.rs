use std::time::Instant;

/// Time values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the epoch, fed to `iTime`.
    pub seconds: f32,
    /// Seconds since the previous sample.
    pub delta: f32,
}

/// Abstraction over where frame times originate from.
pub trait TimeSource {
    /// Moves the epoch to now; the next sample starts again at zero.
    fn reset(&mut self);
    /// Produces the time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    epoch: Instant,
    previous: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            epoch: now,
            previous: now,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.epoch = Instant::now();
    }

    fn sample(&mut self) -> TimeSample {
        let now = Instant::now();
        let sample = TimeSample {
            seconds: now.duration_since(self.epoch).as_secs_f32(),
            delta: now.duration_since(self.previous).as_secs_f32(),
        };
        self.previous = now;
        sample
    }
}

/// Time source advancing by a fixed step per frame, independent of the
/// wall clock. The first sample is at zero.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    step: f64,
    frames: u64,
}

impl SteppedTimeSource {
    pub fn new(step: f64) -> Self {
        Self { step, frames: 0 }
    }
}

impl TimeSource for SteppedTimeSource {
    fn reset(&mut self) {
        self.frames = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample {
            seconds: (self.frames as f64 * self.step) as f32,
            delta: if self.frames == 0 { 0.0 } else { self.step as f32 },
        };
        self.frames += 1;
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Fixed steps of `1 / hz` for a positive frame rate, the wall clock otherwise.
pub fn time_source_for_framerate(hz: Option<f64>) -> BoxedTimeSource {
    match hz {
        Some(hz) if hz > 0.0 => Box::new(SteppedTimeSource::new(1.0 / hz)),
        _ => Box::new(SystemTimeSource::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_source_advances_by_fixed_delta() {
        let mut source = SteppedTimeSource::new(0.25);
        let samples: Vec<f32> = (0..4).map(|_| source.sample().seconds).collect();
        assert_eq!(samples, vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(source.sample().delta, 0.25);
        source.reset();
        assert_eq!(source.sample().seconds, 0.0);
    }

    #[test]
    fn system_source_is_monotonic() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert!(second.seconds >= first.seconds);
        assert!(second.delta >= 0.0);
    }

    #[test]
    fn non_positive_framerate_uses_wall_clock() {
        let mut stepped = time_source_for_framerate(Some(4.0));
        stepped.sample();
        assert_eq!(stepped.sample().seconds, 0.25);

        let mut wall = time_source_for_framerate(Some(-1.0));
        assert!(wall.sample().seconds < 1.0);
        let mut unset = time_source_for_framerate(None);
        assert!(unset.sample().seconds < 1.0);
    }
}
