//! Stand-ins used when no review database is configured.
//!
//! Reads see every image in its default state and every user as a viewer;
//! writes fail with [`QcError::ReadOnly`].

use std::collections::HashMap;

use async_trait::async_trait;

use super::{ReviewStore, ReviewerDirectory};
use crate::domain::{AuditEvent, ImageKey, ReviewMutation, ReviewState, RoleAssignment};
use crate::error::QcError;

/// Review store that holds nothing and rejects writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnlyReviewStore;

#[async_trait]
impl ReviewStore for ReadOnlyReviewStore {
    fn is_writable(&self) -> bool {
        false
    }

    async fn get_states(
        &self,
        _keys: &[ImageKey],
    ) -> Result<HashMap<ImageKey, ReviewState>, QcError> {
        Ok(HashMap::new())
    }

    async fn reviewed_product_ids(&self) -> Result<Vec<String>, QcError> {
        Ok(Vec::new())
    }

    async fn apply(
        &self,
        _key: &ImageKey,
        _mutation: &ReviewMutation,
        _actor: &str,
    ) -> Result<(ReviewState, AuditEvent), QcError> {
        Err(QcError::ReadOnly)
    }

    async fn history(&self, _key: &ImageKey) -> Result<Vec<AuditEvent>, QcError> {
        Ok(Vec::new())
    }
}

/// Directory in which nobody has an assignment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewerOnlyDirectory;

#[async_trait]
impl ReviewerDirectory for ViewerOnlyDirectory {
    async fn lookup(&self, _email: &str) -> Result<RoleAssignment, QcError> {
        Ok(RoleAssignment::UNKNOWN)
    }
}
