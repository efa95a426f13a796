//! Service layer: business logic orchestration.
//!
//! [`CatalogService`] serves the merged read model, [`ReviewService`]
//! applies permission-checked mutations and emits audit events through the
//! [`super::domain::EventBus`], and [`RoleService`] resolves reviewer
//! roles with a short-lived cache.

pub mod catalog_service;
pub mod merge;
pub mod review_service;
pub mod role_service;

pub use catalog_service::{CatalogService, ImagePage};
pub use review_service::{MutationOutcome, ReviewService};
pub use role_service::RoleService;
