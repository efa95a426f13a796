//! Domain layer: image identity, review state, merged read model, roles,
//! listing filters and the audit event system.
//!
//! Source data ([`ProductRow`], [`ImageRecord`]) is immutable. Review data
//! ([`ReviewState`]) is optional per image and only changes through
//! [`ReviewState::apply`], which also yields the matching [`AuditEvent`].

pub mod audit;
pub mod event_bus;
pub mod filter;
pub mod image_key;
pub mod product;
pub mod review;
pub mod role;
pub mod source;

pub use audit::{AuditEvent, AuditEventType};
pub use event_bus::EventBus;
pub use filter::{ImageQuery, SourceFilter, StatusFilter};
pub use image_key::ImageKey;
pub use product::{ImageView, ProductView};
pub use review::{ImageIssues, IssueKey, ReviewMutation, ReviewState, ReviewStatus};
pub use role::{Role, RoleAssignment};
pub use source::{FilterValues, ImageRecord, ProductRow};
