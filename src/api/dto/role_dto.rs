//! Role lookup DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Role;

/// Query parameters for `GET /me/role`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleParams {
    /// Signed-in user's email.
    pub email: String,
}

/// Response body for `GET /me/role`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    /// Normalised email.
    pub email: String,
    /// Effective role.
    pub role: Role,
    /// Whether the email has a directory entry.
    pub exists: bool,
    /// Whether the role may change review state.
    pub can_write: bool,
}
