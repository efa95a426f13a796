//! Data Transfer Objects for REST request/response serialization.
//!
//! Image indexes arrive as plain JSON integers and are range-checked into
//! [`crate::domain::ImageKey`] so out-of-range slots surface as structured
//! 400 errors.

pub mod images_dto;
pub mod review_dto;
pub mod role_dto;

pub use images_dto::*;
pub use review_dto::*;
pub use role_dto::*;
