//! Audit export: mirrors committed audit events into the analytical store.
//!
//! The review store keeps the authoritative event log. [`AuditExporter`]
//! subscribes to the [`crate::domain::EventBus`] and copies each event,
//! tagged with a `source` and its partition date, into an [`AuditSink`].
//! Sinks must be idempotent on `event_id` because failed writes are
//! retried.

pub mod exporter;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::AuditEvent;
use crate::error::QcError;

pub use exporter::{AuditExporter, RetryPolicy};

/// One row of the analytical audit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    /// The committed event.
    #[serde(flatten)]
    pub event: AuditEvent,
    /// Partition date, the UTC date of `event_ts`.
    pub event_date: NaiveDate,
    /// Which writer produced the event.
    pub source: String,
}

impl ExportRecord {
    /// Wraps `event` for export under `source`.
    #[must_use]
    pub fn new(event: AuditEvent, source: &str) -> Self {
        Self {
            event_date: event.event_date(),
            event,
            source: source.to_string(),
        }
    }
}

/// Destination of exported audit records.
#[async_trait]
pub trait AuditSink: Send + Sync + fmt::Debug {
    /// Writes one record. Writing the same `event_id` twice must not
    /// duplicate it.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SourceUnavailable`] if the analytical store fails.
    async fn write(&self, record: &ExportRecord) -> Result<(), QcError>;
}
