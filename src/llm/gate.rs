// ABOUTME: Minimum-interval gate serializing dispatches to the chat-completion API
// ABOUTME: Late arrivals wait out the remainder of the interval; there is no burst allowance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Enforces a minimum spacing between consecutive dispatches
///
/// One gate belongs to one gateway client; every caller of that client goes
/// through it. The lock covers only the read-sleep-update of the last
/// dispatch instant, never the network call that follows.
#[derive(Debug)]
pub struct RequestSpacingGate {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RequestSpacingGate {
    /// Create a gate with the given minimum interval
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::const_new(None),
        }
    }

    /// Configured minimum interval
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a dispatch is allowed, then claim the slot
    pub async fn wait_turn(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "Spacing gateway dispatch"
                );
                sleep(wait).await;
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
    async fn test_first_dispatch_is_immediate() {
        let gate = RequestSpacingGate::new(Duration::from_millis(500));
        let start = Instant::now();
        gate.wait_turn().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let gate = Arc::new(RequestSpacingGate::new(Duration::from_millis(150)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    gate.wait_turn().await;
                    Instant::now()
                })
            })
            .collect();

        let mut latest = start;
        for handle in handles {
            latest = latest.max(handle.await.unwrap());
        }

        // Three dispatches need two full intervals between the first and the last
        assert!(latest - start >= Duration::from_millis(300));
    }
}
