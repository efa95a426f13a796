//! In-memory implementations of the store traits.
//!
//! Backed by `tokio::sync::RwLock` maps. [`MemoryReviewStore`] holds the
//! state map's write lock for the whole read-modify-write, which gives the
//! same per-document atomicity the PostgreSQL store gets from a
//! transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ReviewStore, ReviewerDirectory, SourceTable};
use crate::domain::role::normalize_email;
use crate::domain::source::CREATED_BUCKET_ORDER;
use crate::domain::{
    AuditEvent, FilterValues, ImageKey, ProductRow, ReviewMutation, ReviewState, ReviewStatus,
    Role, RoleAssignment, SourceFilter,
};
use crate::error::QcError;

/// Source table held in a `BTreeMap` keyed by product variant id.
#[derive(Debug, Default)]
pub struct MemorySourceTable {
    rows: RwLock<BTreeMap<String, ProductRow>>,
    unavailable: AtomicBool,
}

impl MemorySourceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding `rows`.
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = ProductRow>) -> Self {
        let map = rows
            .into_iter()
            .map(|r| (r.product_variant_id.clone(), r))
            .collect();
        Self {
            rows: RwLock::new(map),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with
    /// [`QcError::SourceUnavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), QcError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QcError::SourceUnavailable(
                "memory source marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceTable for MemorySourceTable {
    async fn scan_products(
        &self,
        filter: &SourceFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProductRow>, QcError> {
        self.check()?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|r| filter.matches(r))
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn products_by_ids(
        &self,
        filter: &SourceFilter,
        ids: &[String],
    ) -> Result<Vec<ProductRow>, QcError> {
        self.check()?;
        let wanted: BTreeSet<&String> = ids.iter().collect();
        let rows = self.rows.read().await;
        Ok(wanted
            .into_iter()
            .filter_map(|id| rows.get(id))
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn filter_values(&self) -> Result<FilterValues, QcError> {
        self.check()?;
        let rows = self.rows.read().await;
        let mut categories = BTreeSet::new();
        let mut brands = BTreeSet::new();
        let mut buckets = BTreeSet::new();
        for row in rows.values() {
            categories.insert(row.category_name.clone());
            brands.insert(row.brand_name.clone());
            buckets.insert(row.created_date_bucket_label.clone());
        }
        Ok(FilterValues {
            categories: categories.into_iter().collect(),
            brands: brands.into_iter().collect(),
            created_date_buckets: CREATED_BUCKET_ORDER
                .iter()
                .map(|b| (*b).to_string())
                .filter(|b| buckets.contains(b))
                .collect(),
        })
    }
}

/// Review store held in memory, with an append-only event vector.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    states: RwLock<HashMap<ImageKey, ReviewState>>,
    log: RwLock<Vec<AuditEvent>>,
    unavailable: AtomicBool,
}

impl MemoryReviewStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every audit event recorded so far.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.log.read().await.clone()
    }

    /// Makes every subsequent call fail with
    /// [`QcError::ReviewStoreUnavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), QcError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QcError::ReviewStoreUnavailable(
                "memory review store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    fn is_writable(&self) -> bool {
        true
    }

    async fn get_states(
        &self,
        keys: &[ImageKey],
    ) -> Result<HashMap<ImageKey, ReviewState>, QcError> {
        self.check()?;
        let states = self.states.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| states.get(k).map(|s| (k.clone(), s.clone())))
            .collect())
    }

    async fn reviewed_product_ids(&self) -> Result<Vec<String>, QcError> {
        self.check()?;
        let states = self.states.read().await;
        let ids: BTreeSet<String> = states
            .iter()
            .filter(|(_, s)| s.status == ReviewStatus::Reviewed)
            .map(|(k, _)| k.product_variant_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn apply(
        &self,
        key: &ImageKey,
        mutation: &ReviewMutation,
        actor: &str,
    ) -> Result<(ReviewState, AuditEvent), QcError> {
        self.check()?;
        let mut states = self.states.write().await;
        let (next, event) = ReviewState::apply(states.get(key), key, mutation, actor, Utc::now());
        states.insert(key.clone(), next.clone());
        self.log.write().await.push(event.clone());
        Ok((next, event))
    }

    async fn history(&self, key: &ImageKey) -> Result<Vec<AuditEvent>, QcError> {
        self.check()?;
        let log = self.log.read().await;
        Ok(log
            .iter()
            .filter(|e| e.product_variant_id == key.product_variant_id && e.image_index == key.image_index)
            .cloned()
            .collect())
    }
}

/// Reviewer directory held in memory. Counts lookups so callers can
/// observe caching.
#[derive(Debug, Default)]
pub struct MemoryReviewerDirectory {
    roles: RwLock<HashMap<String, Role>>,
    lookups: AtomicUsize,
}

impl MemoryReviewerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `role` to `email`.
    pub async fn assign(&self, email: &str, role: Role) {
        self.roles.write().await.insert(normalize_email(email), role);
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewerDirectory for MemoryReviewerDirectory {
    async fn lookup(&self, email: &str) -> Result<RoleAssignment, QcError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let roles = self.roles.read().await;
        Ok(roles
            .get(email)
            .map_or(RoleAssignment::UNKNOWN, |role| RoleAssignment {
                role: *role,
                exists: true,
            }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::ImageRecord;
    use crate::domain::source::DEFAULT_CREATED_BUCKET;

    /// Builds a product with `images` image slots numbered from 1.
    pub(crate) fn product(pvid: &str, brand: &str, images: u8) -> ProductRow {
        ProductRow {
            product_variant_id: pvid.to_string(),
            brand_name: brand.to_string(),
            product_name: format!("{brand} item"),
            category_name: "Shoes".to_string(),
            subcategory_name: "Sneakers".to_string(),
            l3_category_name: "Running".to_string(),
            created_date_bucket_label: DEFAULT_CREATED_BUCKET.to_string(),
            images: (1..=images)
                .map(|i| ImageRecord {
                    image_index: i,
                    image_url: format!("https://cdn.example.com/{pvid}/{i}.jpg"),
                    aspect_ratio_value: Some("1:1".to_string()),
                    meta_3x4: None,
                    hide_padding: Some(false),
                    dpi: Some(72.0),
                    white_bg: Some(true),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn scan_is_ordered_and_paged() {
        let table = MemorySourceTable::with_rows([
            product("C", "Acme", 1),
            product("A", "Acme", 1),
            product("B", "Other", 1),
        ]);
        let Ok(page) = table.scan_products(&SourceFilter::default(), 1, 5).await else {
            panic!("scan failed");
        };
        let ids: Vec<_> = page.iter().map(|p| p.product_variant_id.as_str()).collect();
        assert_eq!(ids, ["B", "C"]);
    }

    #[tokio::test]
    async fn products_by_ids_applies_filter() {
        let table = MemorySourceTable::with_rows([product("A", "Acme", 1), product("B", "Other", 1)]);
        let filter = SourceFilter {
            brand: Some("Acme".to_string()),
            ..SourceFilter::default()
        };
        let ids = vec!["B".to_string(), "A".to_string(), "Z".to_string()];
        let Ok(rows) = table.products_by_ids(&filter, &ids).await else {
            panic!("lookup failed");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().map(|r| r.product_variant_id.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn apply_appends_one_event_per_write() {
        let store = MemoryReviewStore::new();
        let key = ImageKey::new("A", 1);
        for _ in 0..3 {
            let result = store
                .apply(&key, &ReviewMutation::ToggleStatus, "r@example.com")
                .await;
            assert!(result.is_ok());
        }
        assert_eq!(store.events().await.len(), 3);
        let Ok(history) = store.history(&key).await else {
            panic!("history failed");
        };
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn reviewed_ids_are_distinct_and_sorted() {
        let store = MemoryReviewStore::new();
        for key in [ImageKey::new("B", 1), ImageKey::new("A", 1), ImageKey::new("A", 2)] {
            let _ = store
                .apply(&key, &ReviewMutation::ToggleStatus, "r@example.com")
                .await;
        }
        let Ok(ids) = store.reviewed_product_ids().await else {
            panic!("query failed");
        };
        assert_eq!(ids, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = MemoryReviewStore::new();
        store.set_unavailable(true);
        let result = store.get_states(&[ImageKey::new("A", 1)]).await;
        assert!(matches!(result, Err(QcError::ReviewStoreUnavailable(_))));
    }
}
