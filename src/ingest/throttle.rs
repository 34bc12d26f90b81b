// src/ingest/throttle.rs
//! Per-source request spacing.
//!
//! Each source name gets its own minimum gap between outbound calls. Calls to
//! different sources never wait on each other, and concurrent callers of the
//! same source are spaced out in arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct SourceThrottle {
    /// Earliest instant the next call to each source may start.
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl SourceThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `source` may be called again, reserving the following slot.
    pub async fn wait(&self, source: &str, min_gap: Duration) {
        if min_gap.is_zero() {
            return;
        }

        let start = {
            let mut map = self.next_slot.lock().await;
            let now = Instant::now();
            let start = match map.get(source) {
                Some(&slot) if slot > now => slot,
                _ => now,
            };
            map.insert(source.to_string(), start + min_gap);
            start
        };

        let now = Instant::now();
        if start > now {
            tracing::debug!(
                target: "ingest",
                source,
                sleep_ms = (start - now).as_millis() as u64,
                "throttling source call"
            );
            tokio::time::sleep_until(start).await;
        }
    }
}
