//! REST endpoint handlers organized by resource.

pub mod images;
pub mod review;
pub mod role;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(images::routes())
        .merge(review::routes())
        .merge(role::routes())
}
