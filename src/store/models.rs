//! Database row models and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::source::normalize_bucket;
use crate::domain::{
    AuditEvent, AuditEventType, ImageIssues, ImageKey, ImageRecord, IssueKey, ReviewState,
    ReviewStatus,
};
use crate::error::QcError;

/// One `(product, image slot)` row of the source table.
#[derive(Debug, Clone, FromRow)]
pub struct SourceImageRow {
    /// Product variant id.
    pub product_variant_id: String,
    /// Brand.
    pub brand_name: Option<String>,
    /// Product display name.
    pub product_name: Option<String>,
    /// Level-1 category.
    pub category_name: Option<String>,
    /// Level-2 category.
    pub subcategory_name: Option<String>,
    /// Level-3 category.
    pub l3_category_name: Option<String>,
    /// Nullable created-date bucket.
    pub created_date_bucket_label: Option<String>,
    /// Image slot.
    pub image_index: i32,
    /// Image URL; NULL or empty means the slot is unused.
    pub image_url: Option<String>,
    /// Aspect ratio label.
    pub aspect_ratio: Option<String>,
    /// 3x4 variant link.
    pub meta_3x4: Option<String>,
    /// Padding hidden flag.
    pub hide_padding: Option<bool>,
    /// Resolution.
    pub dpi: Option<f64>,
    /// White background flag.
    pub white_bg: Option<bool>,
}

impl SourceImageRow {
    /// Normalised bucket label of the row.
    #[must_use]
    pub fn bucket_label(&self) -> String {
        normalize_bucket(self.created_date_bucket_label.clone())
    }

    /// Converts the image half of the row. Returns `None` for unused slots
    /// and for slot numbers outside `u8`.
    #[must_use]
    pub fn image(&self) -> Option<ImageRecord> {
        let url = self.image_url.as_deref().filter(|u| !u.is_empty())?;
        let image_index = u8::try_from(self.image_index).ok()?;
        Some(ImageRecord {
            image_index,
            image_url: url.to_string(),
            aspect_ratio_value: self.aspect_ratio.clone(),
            meta_3x4: self.meta_3x4.clone(),
            hide_padding: self.hide_padding,
            dpi: self.dpi,
            white_bg: self.white_bg,
        })
    }
}

/// A row of `qc_current_state`.
#[derive(Debug, Clone, FromRow)]
pub struct StateRow {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot.
    pub image_index: i16,
    /// `REVIEWED` or `NOT_REVIEWED`.
    pub review_status: String,
    /// Issue flags as JSONB.
    pub issues: Json<ImageIssues>,
    /// Remark.
    pub remark: Option<String>,
    /// Last writer.
    pub updated_by: Option<String>,
    /// Last write time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl StateRow {
    /// Splits the row into its key and domain state.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Internal`] if the row holds an unknown status or
    /// an out-of-range image index.
    pub fn into_domain(self) -> Result<(ImageKey, ReviewState), QcError> {
        let key = ImageKey::new(self.product_variant_id, stored_index(self.image_index)?);
        let status = parse_status(&self.review_status)?;
        Ok((
            key,
            ReviewState {
                status,
                issues: self.issues.0,
                remark: self.remark,
                updated_by: self.updated_by,
                updated_at: self.updated_at,
            },
        ))
    }
}

/// A row of `qc_event_log`.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    /// Event id.
    pub event_id: Uuid,
    /// Commit time.
    pub event_ts: DateTime<Utc>,
    /// Event type name.
    pub event_type: String,
    /// Actor email.
    pub actor: String,
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot.
    pub image_index: i16,
    /// Status before.
    pub old_status: Option<String>,
    /// Status after.
    pub new_status: Option<String>,
    /// Issue flag name.
    pub issue_key: Option<String>,
    /// Flag before.
    pub old_issue_value: Option<bool>,
    /// Flag after.
    pub new_issue_value: Option<bool>,
    /// Flags after the change.
    pub issues_snapshot: Option<Json<ImageIssues>>,
    /// Remark before.
    pub old_remark: Option<String>,
    /// Remark after.
    pub new_remark: Option<String>,
}

impl TryFrom<EventRow> for AuditEvent {
    type Error = QcError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.event_id,
            event_ts: row.event_ts,
            event_type: AuditEventType::parse(&row.event_type)?,
            actor: row.actor,
            product_variant_id: row.product_variant_id,
            image_index: stored_index(row.image_index)?,
            old_status: row.old_status.as_deref().map(parse_status).transpose()?,
            new_status: row.new_status.as_deref().map(parse_status).transpose()?,
            issue_key: row
                .issue_key
                .as_deref()
                .map(|k| {
                    k.parse::<IssueKey>()
                        .map_err(|e| QcError::Internal(format!("corrupt audit row: {e}")))
                })
                .transpose()?,
            old_issue_value: row.old_issue_value,
            new_issue_value: row.new_issue_value,
            issues_snapshot: row.issues_snapshot.map(|j| j.0),
            old_remark: row.old_remark,
            new_remark: row.new_remark,
        })
    }
}

fn parse_status(raw: &str) -> Result<ReviewStatus, QcError> {
    raw.parse()
        .map_err(|_| QcError::Internal(format!("corrupt review status '{raw}'")))
}

fn stored_index(raw: i16) -> Result<u8, QcError> {
    u8::try_from(raw).map_err(|_| QcError::Internal(format!("corrupt image index {raw}")))
}
