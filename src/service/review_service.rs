//! Review service: permission-checked review mutations and history.

use std::sync::Arc;

use crate::domain::review::normalize_remark;
use crate::domain::{AuditEvent, EventBus, ImageKey, IssueKey, ReviewMutation, ReviewState};
use crate::error::QcError;
use crate::store::ReviewStore;

use super::role_service::RoleService;

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// State of the image after the write.
    pub state: ReviewState,
    /// Audit event appended by the write.
    pub event: AuditEvent,
}

/// Write side of the dashboard.
///
/// Every mutation follows the same path: reject if read-only → check the
/// actor may write → apply atomically in the store → publish the audit
/// event. A rejected request writes nothing and emits nothing.
#[derive(Debug, Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    roles: Arc<RoleService>,
    event_bus: EventBus,
}

impl ReviewService {
    /// Creates a new `ReviewService`.
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>, roles: Arc<RoleService>, event_bus: EventBus) -> Self {
        Self {
            store,
            roles,
            event_bus,
        }
    }

    /// Whether the backing store accepts writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.store.is_writable()
    }

    /// Flips the review status of one image.
    ///
    /// # Errors
    ///
    /// See [`ReviewService::apply`].
    pub async fn toggle_status(
        &self,
        key: &ImageKey,
        actor: &str,
    ) -> Result<MutationOutcome, QcError> {
        self.apply(key, actor, ReviewMutation::ToggleStatus).await
    }

    /// Sets one issue flag, or flips it when `value` is `None`.
    ///
    /// # Errors
    ///
    /// See [`ReviewService::apply`].
    pub async fn set_issue(
        &self,
        key: &ImageKey,
        actor: &str,
        issue: IssueKey,
        value: Option<bool>,
    ) -> Result<MutationOutcome, QcError> {
        self.apply(key, actor, ReviewMutation::SetIssue { key: issue, value })
            .await
    }

    /// Replaces the remark of one image. Blank text clears it.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] for overlong remarks, otherwise
    /// see [`ReviewService::apply`].
    pub async fn save_remark(
        &self,
        key: &ImageKey,
        actor: &str,
        remark: Option<&str>,
    ) -> Result<MutationOutcome, QcError> {
        let remark = normalize_remark(remark)?;
        self.apply(key, actor, ReviewMutation::SetRemark(remark))
            .await
    }

    /// Returns the audit trail of one image, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::ReviewStoreUnavailable`] if the store fails.
    pub async fn history(&self, key: &ImageKey) -> Result<Vec<AuditEvent>, QcError> {
        self.store.history(key).await
    }

    /// Runs one mutation end to end.
    ///
    /// # Errors
    ///
    /// - [`QcError::ReadOnly`] if no review store is configured.
    /// - [`QcError::InvalidActor`] if `actor` is not an email.
    /// - [`QcError::PermissionDenied`] if the actor is not a reviewer or admin.
    /// - [`QcError::ReviewStoreUnavailable`] if the lookup or write fails.
    pub async fn apply(
        &self,
        key: &ImageKey,
        actor: &str,
        mutation: ReviewMutation,
    ) -> Result<MutationOutcome, QcError> {
        if !self.store.is_writable() {
            return Err(QcError::ReadOnly);
        }
        let (actor, role) = self.roles.require_writer(actor).await?;
        let (state, event) = self.store.apply(key, &mutation, &actor).await?;

        tracing::info!(
            event_id = %event.event_id,
            event_type = event.event_type.as_str(),
            image = %key,
            actor = %actor,
            role = %role,
            "review state changed"
        );
        let _ = self.event_bus.publish(event.clone());

        Ok(MutationOutcome { state, event })
    }
}
