//! Artificial delays for the in-memory store, so front-ends exercise their
//! loading states the same way they would against a remote backend.

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub read: Duration,
    pub list: Duration,
    pub write: Duration,
}

impl SimulatedLatency {
    /// No delay at all; what tests want.
    pub const NONE: Self = Self {
        read: Duration::ZERO,
        list: Duration::ZERO,
        write: Duration::ZERO,
    };

    pub fn from_millis(read: u64, list: u64, write: u64) -> Self {
        Self {
            read: Duration::from_millis(read),
            list: Duration::from_millis(list),
            write: Duration::from_millis(write),
        }
    }

    pub async fn before_read(&self) {
        pause(self.read).await;
    }

    pub async fn before_list(&self) {
        pause(self.list).await;
    }

    pub async fn before_write(&self) {
        pause(self.write).await;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_the_configured_delay() {
        let latency = SimulatedLatency::from_millis(200, 300, 400);
        let started = tokio::time::Instant::now();
        latency.before_write().await;
        assert!(started.elapsed() >= Duration::from_millis(400));
    }
}
