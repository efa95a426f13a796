//! # image-qc-gateway
//!
//! REST backend for product image quality review.
//!
//! Product and image data are read from an analytical source table that is
//! only efficiently scannable forward. Reviewer decisions (status, issue
//! flags, remarks) live in a separate review store and are merged onto the
//! source rows at read time. Every mutation appends an audit event; the
//! audit exporter mirrors those events back into the analytical store.
//!
//! ## Architecture
//!
//! ```text
//! Dashboard UI (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── CatalogService / ReviewService / RoleService (service/)
//!     ├── EventBus (domain/) ──► AuditExporter (export/)
//!     │
//!     ├── SourceTable    (store/)  analytical rows, read-only
//!     ├── ReviewStore    (store/)  review documents + event log
//!     └── ReviewerDirectory (store/)
//! ```
//!
//! Without a review store configured the service runs read-only: every
//! image shows its default state and mutations return 503.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod service;
pub mod store;
