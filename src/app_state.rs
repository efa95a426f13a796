//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{CatalogService, ReviewService, RoleService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Listing and filter options.
    pub catalog: Arc<CatalogService>,
    /// Review mutations and history.
    pub reviews: Arc<ReviewService>,
    /// Role lookups.
    pub roles: Arc<RoleService>,
    /// Default products per page.
    pub default_page_size: u32,
    /// Largest accepted page size.
    pub max_page_size: u32,
}
