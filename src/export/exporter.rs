//! Background task copying events from the bus into an [`AuditSink`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{AuditSink, ExportRecord};
use crate::domain::{AuditEvent, EventBus};

/// Exponential backoff for failed sink writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per event, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Mirrors committed audit events into the analytical store.
#[derive(Debug, Clone)]
pub struct AuditExporter {
    sink: Arc<dyn AuditSink>,
    source: String,
    retry: RetryPolicy,
}

impl AuditExporter {
    /// Creates an exporter tagging records with `source`.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, source: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            sink,
            source: source.into(),
            retry,
        }
    }

    /// Subscribes to `bus` and exports events until the bus closes.
    ///
    /// The subscription is taken before the task is spawned, so events
    /// published after this call returns are never missed.
    #[must_use]
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let rx = bus.subscribe();
        tokio::spawn(async move { self.run(rx).await })
    }

    async fn run(self, mut rx: broadcast::Receiver<AuditEvent>) {
        tracing::info!(source = %self.source, "audit exporter started");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let _ = self.export(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "audit exporter lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("audit exporter stopped");
    }

    /// Writes one event, retrying with exponential backoff.
    ///
    /// Returns `true` once the sink accepted the record and `false` if
    /// every attempt failed.
    pub async fn export(&self, event: AuditEvent) -> bool {
        let record = ExportRecord::new(event, &self.source);
        let mut backoff = self.retry.initial_backoff;
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.sink.write(&record).await {
                Ok(()) => {
                    tracing::debug!(event_id = %record.event.event_id, attempt, "audit event exported");
                    return true;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        event_id = %record.event.event_id,
                        attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "audit export failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2).min(self.retry.max_backoff);
                }
                Err(e) => {
                    tracing::error!(
                        event_id = %record.event.event_id,
                        attempts,
                        error = %e,
                        "audit export gave up"
                    );
                }
            }
        }
        false
    }
}
