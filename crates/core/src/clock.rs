use std::time::Instant;

/// Anything that can report the seconds elapsed since it was armed.
pub trait Stopwatch {
    fn elapsed_seconds(&self) -> f64;
}

/// Wall-clock timer for a single trial. Create a fresh one per run.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started_at: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self { started_at: Instant::now() }
    }

    /// Seconds since [`RunClock::start`]. Monotonic, never negative.
    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl Stopwatch for RunClock {
    fn elapsed_seconds(&self) -> f64 {
        RunClock::elapsed_seconds(self)
    }
}
