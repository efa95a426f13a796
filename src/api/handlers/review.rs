//! Review handlers: status toggle, issue toggle, remark and history.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    HistoryParams, HistoryResponse, IssueToggleRequest, IssueToggleResponse, RemarkRequest,
    RemarkResponse, ToggleRequest, ToggleResponse,
};
use crate::app_state::AppState;
use crate::domain::ImageKey;
use crate::error::{ErrorResponse, QcError};

/// `POST /qc/toggle`: Flip an image between REVIEWED and NOT_REVIEWED.
///
/// # Errors
///
/// Returns [`QcError`] on validation, permission or store failure.
#[utoipa::path(
    post,
    path = "/api/v1/qc/toggle",
    tag = "Review",
    summary = "Toggle review status",
    description = "Flips the review status of one image, keeping its issues and remark, and appends a STATUS_CHANGE audit event.",
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Status toggled", body = ToggleResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Actor may not write", body = ErrorResponse),
        (status = 503, description = "Read-only mode or store unavailable", body = ErrorResponse),
    )
)]
pub async fn toggle_status(
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse, QcError> {
    let key = req.key()?;
    let outcome = state.reviews.toggle_status(&key, &req.actor).await?;
    Ok(Json(ToggleResponse {
        new_status: outcome.state.status,
        event_id: outcome.event.event_id,
    }))
}

/// `POST /qc/issues/toggle`: Set or flip one issue flag.
///
/// # Errors
///
/// Returns [`QcError`] on validation, permission or store failure.
#[utoipa::path(
    post,
    path = "/api/v1/qc/issues/toggle",
    tag = "Review",
    summary = "Toggle an issue flag",
    description = "Sets one issue flag to `value`, or flips it when `value` is omitted, and appends an ISSUE_CHANGE audit event carrying the full issue snapshot.",
    request_body = IssueToggleRequest,
    responses(
        (status = 200, description = "Flag updated", body = IssueToggleResponse),
        (status = 400, description = "Invalid request or issue key", body = ErrorResponse),
        (status = 403, description = "Actor may not write", body = ErrorResponse),
        (status = 503, description = "Read-only mode or store unavailable", body = ErrorResponse),
    )
)]
pub async fn toggle_issue(
    State(state): State<AppState>,
    Json(req): Json<IssueToggleRequest>,
) -> Result<impl IntoResponse, QcError> {
    let key = req.key()?;
    let issue = req.issue()?;
    let outcome = state
        .reviews
        .set_issue(&key, &req.actor, issue, req.value)
        .await?;
    Ok(Json(IssueToggleResponse {
        status: "ok".to_string(),
        event_id: outcome.event.event_id,
        issue_key: issue,
        value: outcome.state.issues.get(issue),
        issues: outcome.state.issues,
    }))
}

/// `POST /qc/remark`: Replace or clear an image remark.
///
/// # Errors
///
/// Returns [`QcError`] on validation, permission or store failure.
#[utoipa::path(
    post,
    path = "/api/v1/qc/remark",
    tag = "Review",
    summary = "Save remark",
    description = "Stores the trimmed remark (blank clears it; at most 2000 characters) and appends a REMARK_CHANGE audit event.",
    request_body = RemarkRequest,
    responses(
        (status = 200, description = "Remark saved", body = RemarkResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Actor may not write", body = ErrorResponse),
        (status = 503, description = "Read-only mode or store unavailable", body = ErrorResponse),
    )
)]
pub async fn save_remark(
    State(state): State<AppState>,
    Json(req): Json<RemarkRequest>,
) -> Result<impl IntoResponse, QcError> {
    let key = req.key()?;
    let outcome = state
        .reviews
        .save_remark(&key, &req.actor, req.remark.as_deref())
        .await?;
    Ok(Json(RemarkResponse {
        status: "ok".to_string(),
        event_id: outcome.event.event_id,
        remark: outcome.state.remark,
    }))
}

/// `GET /qc/history`: Audit trail of one image.
///
/// # Errors
///
/// Returns [`QcError`] on validation or store failure.
#[utoipa::path(
    get,
    path = "/api/v1/qc/history",
    tag = "Review",
    summary = "Image audit history",
    description = "Returns every audit event recorded for one image, oldest first.",
    params(HistoryParams),
    responses(
        (status = 200, description = "Audit events", body = HistoryResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Review store unavailable", body = ErrorResponse),
    )
)]
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, QcError> {
    let key = ImageKey::parse(&params.product_variant_id, params.image_index)?;
    let events = state.reviews.history(&key).await?;
    Ok(Json(HistoryResponse {
        product_variant_id: key.product_variant_id,
        image_index: key.image_index,
        events,
    }))
}

/// Review routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/qc/toggle", post(toggle_status))
        .route("/qc/issues/toggle", post(toggle_issue))
        .route("/qc/remark", post(save_remark))
        .route("/qc/history", get(history))
}
