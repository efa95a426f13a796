//! Listing filters, normalised from raw query parameters.
//!
//! The UI sends `"All"` as a sentinel for "no filter"; every constructor
//! here strips it so stores only ever see real constraints.

use super::review::ReviewStatus;
use super::source::ProductRow;
use crate::error::QcError;

/// Sentinel value meaning "no filter" in every dropdown.
pub const ALL: &str = "All";

/// Review-status filter applied at product level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// No status constraint.
    #[default]
    All,
    /// Only products whose every image is reviewed.
    Reviewed,
    /// Only products with at least one unreviewed image (or no images).
    NotReviewed,
}

impl StatusFilter {
    /// Parses the `status` query parameter. Missing, empty and `"All"` mean
    /// no constraint.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidStatusFilter`] for unknown values.
    pub fn parse(raw: Option<&str>) -> Result<Self, QcError> {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL) => Ok(Self::All),
            Some(other) => Ok(match other.parse::<ReviewStatus>()? {
                ReviewStatus::Reviewed => Self::Reviewed,
                ReviewStatus::NotReviewed => Self::NotReviewed,
            }),
        }
    }

    /// Returns `true` if a product with the given derived status passes.
    #[must_use]
    pub fn accepts(self, status: ReviewStatus) -> bool {
        match self {
            Self::All => true,
            Self::Reviewed => status == ReviewStatus::Reviewed,
            Self::NotReviewed => status == ReviewStatus::NotReviewed,
        }
    }
}

/// Constraints pushed down to the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    /// Exact brand match.
    pub brand: Option<String>,
    /// Level-1 category must be one of these. Empty means any.
    pub categories: Vec<String>,
    /// Exact level-2 category match.
    pub subcategory: Option<String>,
    /// Exact level-3 category match.
    pub l3_category: Option<String>,
    /// Case-insensitive substring of the product variant id.
    pub pvid_contains: Option<String>,
    /// Exact match on the normalised created-date bucket.
    pub created_bucket: Option<String>,
}

impl SourceFilter {
    /// Builds a filter from raw parameters, dropping blanks and `"All"`.
    #[must_use]
    pub fn from_params(
        brand: Option<String>,
        categories: Vec<String>,
        subcategory: Option<String>,
        l3_category: Option<String>,
        pvid_contains: Option<String>,
        created_bucket: Option<String>,
    ) -> Self {
        Self {
            brand: selection(brand),
            categories: categories
                .into_iter()
                .filter_map(|c| selection(Some(c)))
                .collect(),
            subcategory: non_blank(subcategory),
            l3_category: non_blank(l3_category),
            pvid_contains: non_blank(pvid_contains),
            created_bucket: selection(created_bucket),
        }
    }

    /// Evaluates the filter against an in-memory row, with the same
    /// semantics the SQL source applies.
    #[must_use]
    pub fn matches(&self, row: &ProductRow) -> bool {
        if self.brand.as_ref().is_some_and(|b| *b != row.brand_name) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&row.category_name) {
            return false;
        }
        if self
            .subcategory
            .as_ref()
            .is_some_and(|s| *s != row.subcategory_name)
        {
            return false;
        }
        if self
            .l3_category
            .as_ref()
            .is_some_and(|s| *s != row.l3_category_name)
        {
            return false;
        }
        if let Some(needle) = &self.pvid_contains
            && !row
                .product_variant_id
                .to_lowercase()
                .contains(&needle.to_lowercase())
        {
            return false;
        }
        if self
            .created_bucket
            .as_ref()
            .is_some_and(|b| *b != row.created_date_bucket_label)
        {
            return false;
        }
        true
    }
}

/// A complete listing request: status filter, source filter and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    /// Product-level status filter.
    pub status: StatusFilter,
    /// Source-side constraints.
    pub source: SourceFilter,
    /// 1-based page number.
    pub page: u32,
    /// Products per page.
    pub page_size: u32,
}

impl ImageQuery {
    /// Offset of the first product of this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn selection(value: Option<String>) -> Option<String> {
    non_blank(value).filter(|v| v != ALL)
}
