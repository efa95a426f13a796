//! In-memory audit sink.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuditSink, ExportRecord};
use crate::error::QcError;

/// Sink that keeps records in a vector, de-duplicated by `event_id`.
///
/// Can be told to fail the next N writes to exercise retries.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: RwLock<Vec<ExportRecord>>,
    failures_left: AtomicUsize,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Returns every record written so far.
    pub async fn records(&self) -> Vec<ExportRecord> {
        self.records.read().await.clone()
    }

    /// Returns `true` if a record with `event_id` was written.
    pub async fn contains(&self, event_id: Uuid) -> bool {
        self.records
            .read()
            .await
            .iter()
            .any(|r| r.event.event_id == event_id)
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, record: &ExportRecord) -> Result<(), QcError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(QcError::SourceUnavailable(
                "memory audit sink write failed".to_string(),
            ));
        }
        let mut records = self.records.write().await;
        if !records.iter().any(|r| r.event.event_id == record.event.event_id) {
            records.push(record.clone());
        }
        Ok(())
    }
}
