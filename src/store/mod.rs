//! Storage boundary: the analytical source table, the review-state store
//! and the reviewer directory.
//!
//! Each collaborator is a trait so the service layer can run against
//! PostgreSQL ([`postgres`]), in-memory maps ([`memory`], used by tests)
//! or, for the review side, the read-only stand-ins in [`read_only`].
//! Implementations map their native errors to
//! [`QcError::SourceUnavailable`] / [`QcError::ReviewStoreUnavailable`].

pub mod memory;
pub mod models;
pub mod postgres;
pub mod read_only;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    AuditEvent, FilterValues, ImageKey, ProductRow, ReviewMutation, ReviewState, RoleAssignment,
    SourceFilter,
};
use crate::error::QcError;

/// Read-only, forward-scannable table of products and their images.
#[async_trait]
pub trait SourceTable: Send + Sync + fmt::Debug {
    /// Returns up to `limit` products matching `filter`, ordered by
    /// product variant id, skipping the first `offset` matches.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SourceUnavailable`] if the store fails.
    async fn scan_products(
        &self,
        filter: &SourceFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductRow>, QcError>;

    /// Returns the products among `ids` that match `filter`, ordered by
    /// product variant id.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SourceUnavailable`] if the store fails.
    async fn products_by_ids(
        &self,
        filter: &SourceFilter,
        ids: &[String],
    ) -> Result<Vec<ProductRow>, QcError>;

    /// Returns the distinct category, brand and bucket values.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SourceUnavailable`] if the store fails.
    async fn filter_values(&self) -> Result<FilterValues, QcError>;
}

/// Mutable review documents keyed by [`ImageKey`], plus their audit log.
#[async_trait]
pub trait ReviewStore: Send + Sync + fmt::Debug {
    /// Whether this store accepts writes.
    fn is_writable(&self) -> bool;

    /// Returns the stored state of every key that has a document. Keys
    /// without a document are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReviewStoreUnavailable`] if the store fails.
    async fn get_states(
        &self,
        keys: &[ImageKey],
    ) -> Result<HashMap<ImageKey, ReviewState>, QcError>;

    /// Returns, sorted and de-duplicated, every product variant id with at
    /// least one REVIEWED image document.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReviewStoreUnavailable`] if the store fails.
    async fn reviewed_product_ids(&self) -> Result<Vec<String>, QcError>;

    /// Atomically reads the current state of `key`, applies `mutation`,
    /// writes the new state and appends the audit event.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReadOnly`] on read-only stores and
    /// [`QcError::ReviewStoreUnavailable`] if the write fails. Nothing is
    /// written on error.
    async fn apply(
        &self,
        key: &ImageKey,
        mutation: &ReviewMutation,
        actor: &str,
    ) -> Result<(ReviewState, AuditEvent), QcError>;

    /// Returns the audit events for `key`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReviewStoreUnavailable`] if the store fails.
    async fn history(&self, key: &ImageKey) -> Result<Vec<AuditEvent>, QcError>;
}

/// Email → role assignments.
#[async_trait]
pub trait ReviewerDirectory: Send + Sync + fmt::Debug {
    /// Looks up a normalised email.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReviewStoreUnavailable`] if the lookup fails.
    async fn lookup(&self, email: &str) -> Result<RoleAssignment, QcError>;
}
