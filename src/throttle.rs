//! Minimum spacing between outbound document fetches.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Grants one slot at a time, at least `interval` apart. No bursts.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next slot is due. The lock is held while sleeping so
    /// waiters are released in order.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let due = prev + self.interval;
            if due > Instant::now() {
                sleep_until(due).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_slot_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(60));
        let start = std::time::Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_slots_are_spaced() {
        let throttle = Throttle::new(Duration::from_millis(40));
        let start = std::time::Instant::now();
        for _ in 0..3 {
            throttle.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_concurrent_waiters_are_spaced() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(30)));
        let start = std::time::Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let throttle = throttle.clone();
            handles.push(tokio::spawn(async move { throttle.wait().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
