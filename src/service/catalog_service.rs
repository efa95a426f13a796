//! Catalog service: paginated image listing and filter options.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::filter::ALL;
use crate::domain::{
    FilterValues, ImageKey, ImageQuery, ProductView, ReviewState, ReviewStatus, StatusFilter,
};
use crate::error::QcError;
use crate::store::{ReviewStore, SourceTable};

use super::merge::{collect_keys, merge_products};

/// Candidate ids are sent to the source in batches of this size.
const ID_BATCH: usize = 1000;

/// One page of merged products.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePage {
    /// Products on this page, ordered by product variant id.
    pub items: Vec<ProductView>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Whether a further page may exist.
    pub has_more: bool,
    /// `true` when review state could not be read and every image is
    /// shown with its default state.
    pub review_state_degraded: bool,
}

/// Read side of the dashboard: merges the source table with review state.
///
/// Listing without a status filter, or with `NOT_REVIEWED`, scans one page
/// of the source and filters it after the merge, so such pages can hold
/// fewer than `page_size` products. `REVIEWED` listings are driven by the
/// review store and paginated exactly.
#[derive(Debug, Clone)]
pub struct CatalogService {
    source: Arc<dyn SourceTable>,
    reviews: Arc<dyn ReviewStore>,
}

impl CatalogService {
    /// Creates a new `CatalogService`.
    #[must_use]
    pub fn new(source: Arc<dyn SourceTable>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self { source, reviews }
    }

    /// Returns one page of products with merged review state.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::SourceUnavailable`] if the source fails, and
    /// [`QcError::ReviewStoreUnavailable`] if a `REVIEWED` listing cannot
    /// read review state.
    pub async fn list_images(&self, query: &ImageQuery) -> Result<ImagePage, QcError> {
        let page = match query.status {
            StatusFilter::Reviewed => self.list_reviewed(query).await?,
            StatusFilter::All | StatusFilter::NotReviewed => self.list_scanned(query).await?,
        };
        tracing::debug!(
            page = page.page,
            items = page.items.len(),
            has_more = page.has_more,
            degraded = page.review_state_degraded,
            "listed images"
        );
        Ok(page)
    }

    async fn list_scanned(&self, query: &ImageQuery) -> Result<ImagePage, QcError> {
        let rows = self
            .source
            .scan_products(&query.source, query.offset(), query.page_size)
            .await?;
        let has_more = rows.len() >= query.page_size as usize;

        let keys = collect_keys(&rows);
        let (states, degraded) = match self.reviews.get_states(&keys).await {
            Ok(states) => (states, false),
            Err(e) => {
                tracing::warn!(error = %e, "review state unavailable; serving defaults");
                (HashMap::new(), true)
            }
        };

        let items = merge_products(rows, &states)
            .into_iter()
            .filter(|p| query.status.accepts(p.pvid_review_status))
            .collect();

        Ok(ImagePage {
            items,
            page: query.page,
            page_size: query.page_size,
            has_more,
            review_state_degraded: degraded,
        })
    }

    async fn list_reviewed(&self, query: &ImageQuery) -> Result<ImagePage, QcError> {
        let candidates = self.reviews.reviewed_product_ids().await?;

        let mut rows = Vec::new();
        for batch in candidates.chunks(ID_BATCH) {
            rows.extend(self.source.products_by_ids(&query.source, batch).await?);
        }

        let keys: Vec<ImageKey> = collect_keys(&rows);
        let states: HashMap<ImageKey, ReviewState> = self.reviews.get_states(&keys).await?;

        let mut reviewed: Vec<ProductView> = merge_products(rows, &states)
            .into_iter()
            .filter(|p| p.pvid_review_status == ReviewStatus::Reviewed)
            .collect();
        reviewed.sort_by(|a, b| a.product_variant_id.cmp(&b.product_variant_id));

        let start = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let end = start.saturating_add(query.page_size as usize);
        let has_more = reviewed.len() > end;
        let items = reviewed
            .into_iter()
            .skip(start)
            .take(query.page_size as usize)
            .collect();

        Ok(ImagePage {
            items,
            page: query.page,
            page_size: query.page_size,
            has_more,
            review_state_degraded: false,
        })
    }

    /// Returns the dropdown options, each list led by `"All"`.
    ///
    /// Never fails: if the source is unavailable every list is just
    /// `["All"]`.
    pub async fn filter_options(&self) -> FilterValues {
        let values = match self.source.filter_values().await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(error = %e, "filter values unavailable; serving defaults");
                FilterValues::default()
            }
        };
        FilterValues {
            categories: with_all(values.categories),
            brands: with_all(values.brands),
            created_date_buckets: with_all(values.created_date_buckets),
        }
    }
}

fn with_all(values: Vec<String>) -> Vec<String> {
    std::iter::once(ALL.to_string())
        .chain(values.into_iter().filter(|v| !v.is_empty() && v != ALL))
        .collect()
}
