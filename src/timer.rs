//! A small monotonic stopwatch attached to every socket handle. The handle restarts it around
//! each timed operation (connect, bind, listen, accept, send and receive) so callers can read how
//! long the most recent call spent inside the OS.

use std::time::{Duration, Instant};

/// Captures a start and an end [Instant] around an operation.
///
/// The measured duration is always `end - start`. When the end mark precedes the start mark, or
/// either mark is missing, the duration is zero rather than negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatTimer {
    start: Option<Instant>,
    end: Option<Instant>,
}

impl StatTimer {
    pub fn new() -> StatTimer {
        StatTimer::default()
    }

    /// Mark the start of a measurement and forget any previous end mark.
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
        self.end = None;
    }

    /// Mark the end of the current measurement.
    pub fn stop(&mut self) {
        self.end = Some(Instant::now());
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.start
    }

    pub fn stopped_at(&self) -> Option<Instant> {
        self.end
    }

    /// The duration between the start and end marks, see the type level docs for the sign
    /// convention.
    pub fn elapsed(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    pub fn millis(&self) -> u128 {
        self.elapsed().as_millis()
    }

    pub fn micros(&self) -> u128 {
        self.elapsed().as_micros()
    }

    /// Run `op` between a start and an end mark, returning its output.
    pub fn measure<T>(&mut self, op: impl FnOnce() -> T) -> T {
        self.start();
        let out = op();
        self.stop();
        out
    }
}
