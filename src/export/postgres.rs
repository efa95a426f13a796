//! PostgreSQL audit sink writing into the analytical audit table.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use super::{AuditSink, ExportRecord};
use crate::error::QcError;
use crate::store::postgres::validate_table_name;

/// Inserts export records into a configurable table, ignoring duplicates.
///
/// The table is not managed by this service; see `schema/qc_audit_log.sql`.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
    insert_sql: String,
}

impl PgAuditSink {
    /// Creates a sink writing into `table`.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] if `table` is not a plain
    /// identifier.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, QcError> {
        validate_table_name(table)?;
        let insert_sql = format!(
            "INSERT INTO {table} (event_id, event_ts, event_date, event_type, actor, \
             product_variant_id, image_index, old_status, new_status, issue_key, \
             old_issue_value, new_issue_value, issues_snapshot, old_remark, new_remark, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (event_id) DO NOTHING"
        );
        Ok(Self { pool, insert_sql })
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn write(&self, record: &ExportRecord) -> Result<(), QcError> {
        let event = &record.event;
        sqlx::query(&self.insert_sql)
            .bind(event.event_id)
            .bind(event.event_ts)
            .bind(record.event_date)
            .bind(event.event_type.as_str())
            .bind(&event.actor)
            .bind(&event.product_variant_id)
            .bind(i16::from(event.image_index))
            .bind(event.old_status.map(|s| s.as_str()))
            .bind(event.new_status.map(|s| s.as_str()))
            .bind(event.issue_key.map(|k| k.as_str()))
            .bind(event.old_issue_value)
            .bind(event.new_issue_value)
            .bind(event.issues_snapshot.map(Json))
            .bind(event.old_remark.as_deref())
            .bind(event.new_remark.as_deref())
            .bind(&record.source)
            .execute(&self.pool)
            .await
            .map_err(|e| QcError::AuditSinkUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::domain::{ImageKey, ReviewMutation, ReviewState};
    use crate::store::postgres::{PoolSettings, connect_lazy};

    fn unreachable_pool() -> PgPool {
        let settings = PoolSettings {
            max_connections: 1,
            min_connections: 0,
            connect_timeout: Duration::from_millis(200),
        };
        let Ok(pool) = connect_lazy("postgres://qc:qc@127.0.0.1:1/qc", settings) else {
            panic!("url should parse");
        };
        pool
    }

    #[tokio::test]
    async fn rejects_unsafe_table_names() {
        let result = PgAuditSink::new(unreachable_pool(), "audit; DROP TABLE x");
        assert!(matches!(result, Err(QcError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn write_failure_is_reported_as_audit_sink_outage() {
        let Ok(sink) = PgAuditSink::new(unreachable_pool(), "qc_audit_log") else {
            panic!("table name should validate");
        };
        let (_, event) = ReviewState::apply(
            None,
            &ImageKey::new("PV-1", 1),
            &ReviewMutation::ToggleStatus,
            "r@example.com",
            Utc::now(),
        );
        let result = sink.write(&ExportRecord::new(event, "review_api")).await;
        assert!(matches!(result, Err(QcError::AuditSinkUnavailable(_))));
    }
}
