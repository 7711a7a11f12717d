//! Minimum-interval throttle for outbound API calls
//!
//! The fetcher consults a `Throttle` before each network request so consecutive
//! lookups are spaced out, independent of any progress reporting.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between outbound requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Enforces a minimum interval between successive calls to [`ready`](Throttle::ready)
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl Throttle {
    /// Creates a throttle; a zero interval never waits
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous call
    ///
    /// The first call returns immediately.
    pub async fn ready(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait = ?wait, "Throttling outbound request");
                tokio::time::sleep(wait).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
