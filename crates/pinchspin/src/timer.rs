//! Event rate logging.

use std::time::{Duration, Instant};

/// Counts events and logs their per-second rate.
pub struct RateCounter {
    name: String,
    count: u32,
    total: u64,
    start: Instant,
}

impl RateCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            count: 0,
            total: 0,
            start: Instant::now(),
        }
    }

    /// Records one event and logs the rate if at least one second has passed since the last log.
    pub fn tick(&mut self) {
        self.count += 1;
        self.total += 1;

        let elapsed = self.start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let rate = self.count as f32 / elapsed.as_secs_f32();
            log::debug!("{}: {rate:.1}/s", self.name);

            self.count = 0;
            self.start = Instant::now();
        }
    }

    /// Number of events recorded since creation.
    pub fn total(&self) -> u64 {
        self.total
    }
}
