//! Append-only audit events for review-state changes.
//!
//! Every committed mutation yields exactly one [`AuditEvent`]. Events are
//! stored next to the review state, published on the
//! [`super::EventBus`], and mirrored to the analytical audit table by the
//! exporter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ImageKey;
use super::review::{ImageIssues, IssueKey, ReviewStatus};
use crate::error::QcError;

/// Kind of change an [`AuditEvent`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// Review status flipped.
    StatusChange,
    /// One issue flag changed.
    IssueChange,
    /// Remark replaced or cleared.
    RemarkChange,
}

impl AuditEventType {
    /// Returns the event type as stored in the audit tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StatusChange => "STATUS_CHANGE",
            Self::IssueChange => "ISSUE_CHANGE",
            Self::RemarkChange => "REMARK_CHANGE",
        }
    }

    /// Parses a stored event type.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Internal`] for unknown values, which indicate a
    /// corrupt row.
    pub fn parse(s: &str) -> Result<Self, QcError> {
        match s {
            "STATUS_CHANGE" => Ok(Self::StatusChange),
            "ISSUE_CHANGE" => Ok(Self::IssueChange),
            "REMARK_CHANGE" => Ok(Self::RemarkChange),
            other => Err(QcError::Internal(format!("unknown audit event type {other}"))),
        }
    }
}

/// One immutable audit record.
///
/// Fields that do not apply to the event type are `None`: a status change
/// carries only `old_status`/`new_status`, an issue change carries the
/// issue fields plus the full `issues_snapshot`, a remark change carries
/// `old_remark`/`new_remark`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event id (UUID v4).
    pub event_id: Uuid,
    /// Commit timestamp.
    pub event_ts: DateTime<Utc>,
    /// Kind of change.
    pub event_type: AuditEventType,
    /// Email of the reviewer who made the change.
    pub actor: String,
    /// Product variant id.
    pub product_variant_id: String,
    /// 1-based image slot.
    pub image_index: u8,
    /// Status before a status change.
    pub old_status: Option<ReviewStatus>,
    /// Status after a status change.
    pub new_status: Option<ReviewStatus>,
    /// Flag touched by an issue change.
    pub issue_key: Option<IssueKey>,
    /// Flag value before an issue change.
    pub old_issue_value: Option<bool>,
    /// Flag value after an issue change.
    pub new_issue_value: Option<bool>,
    /// All flags after an issue change.
    pub issues_snapshot: Option<ImageIssues>,
    /// Remark before a remark change.
    pub old_remark: Option<String>,
    /// Remark after a remark change.
    pub new_remark: Option<String>,
}

impl AuditEvent {
    /// Returns the key of the image this event belongs to.
    #[must_use]
    pub fn image_key(&self) -> ImageKey {
        ImageKey::new(self.product_variant_id.clone(), self.image_index)
    }

    /// Partition date of the event in the analytical audit table.
    #[must_use]
    pub fn event_date(&self) -> NaiveDate {
        self.event_ts.date_naive()
    }
}
