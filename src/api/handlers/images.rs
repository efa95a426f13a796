//! Listing handlers: merged image listing and filter options.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;

use crate::api::dto::{FilterOptionsResponse, ImagesParams, ImagesResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, QcError};

/// `GET /images`: One page of products with merged review state.
///
/// # Errors
///
/// Returns [`QcError`] on invalid parameters or store failure.
#[utoipa::path(
    get,
    path = "/api/v1/images",
    tag = "Images",
    summary = "List product images",
    description = "Returns one page of products ordered by product variant id, each with its images and their review state. With `status=NOT_REVIEWED` a page may hold fewer than `page_size` products while `has_more` is still true.",
    params(ImagesParams),
    responses(
        (status = 200, description = "One page of products", body = ImagesResponse),
        (status = 400, description = "Invalid filter or paging", body = ErrorResponse),
        (status = 503, description = "Source or review store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ImagesParams>,
) -> Result<impl IntoResponse, QcError> {
    let query = params.into_query(state.default_page_size, state.max_page_size)?;
    let page = state.catalog.list_images(&query).await?;
    Ok(Json(ImagesResponse::from(page)))
}

/// `GET /filters`: Dropdown options.
#[utoipa::path(
    get,
    path = "/api/v1/filters",
    tag = "Images",
    summary = "List filter options",
    description = "Returns categories, brands and created-date buckets, each led by \"All\". Falls back to [\"All\"] lists when the source is unavailable.",
    responses(
        (status = 200, description = "Filter options", body = FilterOptionsResponse),
    )
)]
pub async fn filter_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(FilterOptionsResponse::from(state.catalog.filter_options().await))
}

/// Listing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(list_images))
        .route("/filters", get(filter_options))
}
