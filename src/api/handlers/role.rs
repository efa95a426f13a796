//! Role lookup handler.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RoleParams, RoleResponse};
use crate::app_state::AppState;
use crate::domain::role::normalize_email;

/// `GET /me/role`: Role of the signed-in user.
///
/// Lookup failures degrade to a viewer without an assignment.
#[utoipa::path(
    get,
    path = "/api/v1/me/role",
    tag = "Roles",
    summary = "Look up a user's role",
    description = "Returns the role assigned to an email. Unknown emails, and any lookup failure, yield `viewer` with `exists: false`.",
    params(RoleParams),
    responses(
        (status = 200, description = "Role assignment", body = RoleResponse),
    )
)]
pub async fn my_role(
    State(state): State<AppState>,
    Query(params): Query<RoleParams>,
) -> impl IntoResponse {
    let assignment = state.roles.role_for(&params.email).await;
    Json(RoleResponse {
        email: normalize_email(&params.email),
        role: assignment.role,
        exists: assignment.exists,
        can_write: assignment.role.can_write(),
    })
}

/// Role routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/me/role", get(my_role))
}
