//! Review mutation and history DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{AuditEvent, ImageIssues, ImageKey, IssueKey, ReviewStatus};
use crate::error::QcError;

/// Request body for `POST /qc/toggle`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot, 1 to 10.
    pub image_index: i64,
    /// Email of the reviewer making the change.
    pub actor: String,
}

impl ToggleRequest {
    /// Validated image key.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] for a blank id or bad slot.
    pub fn key(&self) -> Result<ImageKey, QcError> {
        ImageKey::parse(&self.product_variant_id, self.image_index)
    }
}

/// Response body for `POST /qc/toggle`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    /// Status after the toggle.
    pub new_status: ReviewStatus,
    /// Id of the appended audit event.
    pub event_id: Uuid,
}

/// Request body for `POST /qc/issues/toggle`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueToggleRequest {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot, 1 to 10.
    pub image_index: i64,
    /// Email of the reviewer making the change.
    pub actor: String,
    /// One of `image_blur`, `cropped_image`, `mrp_present_in_image`,
    /// `image_quality`, `aspect_ratio`.
    pub issue_key: String,
    /// Target value. Omit to flip the current value.
    #[serde(default)]
    pub value: Option<bool>,
}

impl IssueToggleRequest {
    /// Validated image key.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] for a blank id or bad slot.
    pub fn key(&self) -> Result<ImageKey, QcError> {
        ImageKey::parse(&self.product_variant_id, self.image_index)
    }

    /// Validated issue flag.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidIssueKey`] for unknown flags.
    pub fn issue(&self) -> Result<IssueKey, QcError> {
        self.issue_key.parse()
    }
}

/// Response body for `POST /qc/issues/toggle`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueToggleResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Id of the appended audit event.
    pub event_id: Uuid,
    /// Flag that changed.
    pub issue_key: IssueKey,
    /// Value of the flag after the change.
    pub value: bool,
    /// Every flag after the change.
    pub issues: ImageIssues,
}

/// Request body for `POST /qc/remark`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RemarkRequest {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot, 1 to 10.
    pub image_index: i64,
    /// Email of the reviewer making the change.
    pub actor: String,
    /// New remark. Blank or missing clears it.
    #[serde(default)]
    pub remark: Option<String>,
}

impl RemarkRequest {
    /// Validated image key.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] for a blank id or bad slot.
    pub fn key(&self) -> Result<ImageKey, QcError> {
        ImageKey::parse(&self.product_variant_id, self.image_index)
    }
}

/// Response body for `POST /qc/remark`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemarkResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Id of the appended audit event.
    pub event_id: Uuid,
    /// Stored remark after normalisation.
    pub remark: Option<String>,
}

/// Query parameters for `GET /qc/history`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot, 1 to 10.
    pub image_index: i64,
}

/// Response body for `GET /qc/history`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Product variant id.
    pub product_variant_id: String,
    /// Image slot.
    pub image_index: u8,
    /// Audit events, oldest first.
    pub events: Vec<AuditEvent>,
}
