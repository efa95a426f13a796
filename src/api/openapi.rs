//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto::{
    FilterOptionsResponse, HistoryResponse, ImagesResponse, IssueToggleRequest,
    IssueToggleResponse, RemarkRequest, RemarkResponse, RoleResponse, ToggleRequest,
    ToggleResponse,
};
use super::handlers;
use crate::domain::{
    AuditEvent, AuditEventType, ImageIssues, ImageView, IssueKey, ProductView, ReviewStatus, Role,
};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI specification of the REST API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "image-qc-gateway",
        description = "Product image QC review backend: merged listing, audited review mutations and role lookup."
    ),
    paths(
        handlers::images::list_images,
        handlers::images::filter_options,
        handlers::review::toggle_status,
        handlers::review::toggle_issue,
        handlers::review::save_remark,
        handlers::review::history,
        handlers::role::my_role,
        handlers::system::health_handler,
    ),
    components(schemas(
        ImagesResponse,
        FilterOptionsResponse,
        ProductView,
        ImageView,
        ImageIssues,
        ReviewStatus,
        IssueKey,
        ToggleRequest,
        ToggleResponse,
        IssueToggleRequest,
        IssueToggleResponse,
        RemarkRequest,
        RemarkResponse,
        HistoryResponse,
        AuditEvent,
        AuditEventType,
        RoleResponse,
        Role,
        ErrorResponse,
        ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Images", description = "Merged product/image listing and filter options"),
        (name = "Review", description = "Review status, issue flags, remarks and audit history"),
        (name = "Roles", description = "Reviewer role lookup"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/images",
            "/api/v1/filters",
            "/api/v1/qc/toggle",
            "/api/v1/qc/issues/toggle",
            "/api/v1/qc/remark",
            "/api/v1/qc/history",
            "/api/v1/me/role",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
