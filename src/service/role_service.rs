//! Role service: cached reviewer-directory lookups and write checks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::domain::role::{is_valid_email, normalize_email};
use crate::domain::{Role, RoleAssignment};
use crate::error::QcError;
use crate::store::ReviewerDirectory;

/// Upper bound on cached role assignments.
const MAX_CACHED_ROLES: usize = 10_000;

/// Resolves emails to roles, caching known reviewers for a fixed TTL.
///
/// Failed lookups and emails absent from the directory are never cached.
/// Expired entries are evicted on every insert. A TTL of zero disables the
/// cache.
#[derive(Debug)]
pub struct RoleService {
    directory: Arc<dyn ReviewerDirectory>,
    ttl: Duration,
    cache: RwLock<HashMap<String, (RoleAssignment, Instant)>>,
}

impl RoleService {
    /// Creates a new `RoleService`.
    #[must_use]
    pub fn new(directory: Arc<dyn ReviewerDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Looks up the role of `email`.
    ///
    /// # Errors
    ///
    /// Propagates directory failures.
    pub async fn lookup(&self, email: &str) -> Result<RoleAssignment, QcError> {
        let email = normalize_email(email);
        if let Some(hit) = self.cached(&email).await {
            return Ok(hit);
        }
        let assignment = self.directory.lookup(&email).await?;
        if assignment.exists && !self.ttl.is_zero() {
            self.remember(email, assignment).await;
        }
        Ok(assignment)
    }

    /// Looks up the role of `email` for display, treating any failure as
    /// "viewer without an assignment".
    pub async fn role_for(&self, email: &str) -> RoleAssignment {
        match self.lookup(email).await {
            Ok(assignment) => assignment,
            Err(e) => {
                tracing::warn!(error = %e, "role lookup failed; defaulting to viewer");
                RoleAssignment::UNKNOWN
            }
        }
    }

    /// Validates `actor` and checks it may write.
    ///
    /// Returns the normalised email and the actor's role.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidActor`] for malformed emails,
    /// [`QcError::PermissionDenied`] for viewers, and propagates directory
    /// failures.
    pub async fn require_writer(&self, actor: &str) -> Result<(String, Role), QcError> {
        let email = normalize_email(actor);
        if !is_valid_email(&email) {
            return Err(QcError::InvalidActor(actor.trim().to_string()));
        }
        let assignment = self.lookup(&email).await?;
        if !assignment.role.can_write() {
            tracing::warn!(actor = %email, role = %assignment.role, "write rejected");
            return Err(QcError::PermissionDenied { actor: email });
        }
        Ok((email, assignment.role))
    }

    async fn remember(&self, email: String, assignment: RoleAssignment) {
        let mut cache = self.cache.write().await;
        let ttl = self.ttl;
        cache.retain(|_, (_, at)| at.elapsed() < ttl);
        if cache.len() >= MAX_CACHED_ROLES && !cache.contains_key(&email) {
            return;
        }
        cache.insert(email, (assignment, Instant::now()));
    }

    async fn cached(&self, email: &str) -> Option<RoleAssignment> {
        let cache = self.cache.read().await;
        let (assignment, at) = cache.get(email)?;
        (at.elapsed() < self.ttl).then_some(*assignment)
    }
}
