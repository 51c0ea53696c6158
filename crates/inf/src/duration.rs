use std::time::{Duration, Instant};

/// Measures the wall clock time of an operation
pub struct Recorder {
    start: Instant,
}

impl Recorder {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_time(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_time_string(&self) -> String {
        format_duration(self.elapsed_time())
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Human readable representation of a duration: "2 minutes 5 seconds" or "3.250 seconds"
pub fn format_duration(duration: Duration) -> String {
    let elapsed = chrono::TimeDelta::from_std(duration).unwrap_or_default();

    if elapsed.num_seconds() > 60 {
        let minutes = elapsed.num_minutes();
        let seconds = elapsed.num_seconds() - (minutes * 60);
        format!("{} minutes {} seconds", minutes, seconds)
    } else {
        let seconds = elapsed.num_seconds();
        let milliseconds = elapsed.num_milliseconds() - (seconds * 1000);
        format!("{}.{:03} seconds", seconds, milliseconds)
    }
}
