//! Listing and filter-option DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{FilterValues, ImageQuery, ProductView, SourceFilter, StatusFilter};
use crate::error::QcError;
use crate::service::ImagePage;

/// Query parameters for `GET /images`.
///
/// `category_name` may be repeated; every other parameter is single-valued.
/// `"All"` and blank values mean "no filter".
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImagesParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Products per page. Defaults to the configured page size.
    pub page_size: Option<u32>,
    /// `All`, `REVIEWED` or `NOT_REVIEWED`.
    pub status: Option<String>,
    /// Exact brand.
    pub brand: Option<String>,
    /// Level-1 categories (repeatable).
    #[serde(default)]
    pub category_name: Vec<String>,
    /// Exact level-2 category.
    pub subcategory_name: Option<String>,
    /// Exact level-3 category.
    pub l3_category_name: Option<String>,
    /// Case-insensitive substring of the product variant id.
    pub product_variant_id: Option<String>,
    /// Created-date bucket label.
    pub created_bucket: Option<String>,
}

impl ImagesParams {
    /// Validates the parameters and builds the listing query.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidStatusFilter`] for unknown statuses and
    /// [`QcError::InvalidRequest`] for out-of-range paging.
    pub fn into_query(self, default_page_size: u32, max_page_size: u32) -> Result<ImageQuery, QcError> {
        let status = StatusFilter::parse(self.status.as_deref())?;
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(QcError::InvalidRequest("page must be at least 1".to_string()));
        }
        let page_size = self.page_size.unwrap_or(default_page_size);
        if page_size == 0 || page_size > max_page_size {
            return Err(QcError::InvalidRequest(format!(
                "page_size must be between 1 and {max_page_size}"
            )));
        }
        Ok(ImageQuery {
            status,
            source: SourceFilter::from_params(
                self.brand,
                self.category_name,
                self.subcategory_name,
                self.l3_category_name,
                self.product_variant_id,
                self.created_bucket,
            ),
            page,
            page_size,
        })
    }
}

/// Response body for `GET /images`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImagesResponse {
    /// Products on this page, ordered by product variant id.
    pub items: Vec<ProductView>,
    /// Current page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Whether another page may follow. With `status=NOT_REVIEWED` a page
    /// can be short, or even empty, while this is still `true`.
    pub has_more: bool,
    /// `true` when review state could not be read and defaults are shown.
    pub review_state_degraded: bool,
}

impl From<ImagePage> for ImagesResponse {
    fn from(page: ImagePage) -> Self {
        Self {
            items: page.items,
            page: page.page,
            page_size: page.page_size,
            has_more: page.has_more,
            review_state_degraded: page.review_state_degraded,
        }
    }
}

/// Response body for `GET /filters`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FilterOptionsResponse {
    /// `"All"` followed by the sorted level-1 categories.
    pub categories: Vec<String>,
    /// `"All"` followed by the sorted brands.
    pub brands: Vec<String>,
    /// `"All"` followed by the present buckets in their fixed order.
    pub created_date_buckets: Vec<String>,
}

impl From<FilterValues> for FilterOptionsResponse {
    fn from(values: FilterValues) -> Self {
        Self {
            categories: values.categories,
            brands: values.brands,
            created_date_buckets: values.created_date_buckets,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let Ok(query) = ImagesParams::default().into_query(100, 100) else {
            panic!("defaults should be valid");
        };
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.status, StatusFilter::All);
        assert_eq!(query.source, SourceFilter::default());
    }

    #[test]
    fn paging_bounds_are_enforced() {
        let zero_page = ImagesParams {
            page: Some(0),
            ..ImagesParams::default()
        };
        assert!(matches!(zero_page.into_query(100, 100), Err(QcError::InvalidRequest(_))));

        let too_large = ImagesParams {
            page_size: Some(101),
            ..ImagesParams::default()
        };
        assert!(matches!(too_large.into_query(100, 100), Err(QcError::InvalidRequest(_))));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let params = ImagesParams {
            status: Some("DONE".to_string()),
            ..ImagesParams::default()
        };
        assert!(matches!(
            params.into_query(100, 100),
            Err(QcError::InvalidStatusFilter(_))
        ));
    }

    #[test]
    fn all_categories_are_dropped() {
        let params = ImagesParams {
            category_name: vec!["All".to_string(), "Shoes".to_string()],
            brand: Some("All".to_string()),
            ..ImagesParams::default()
        };
        let Ok(query) = params.into_query(100, 100) else {
            panic!("params should be valid");
        };
        assert_eq!(query.source.categories, vec!["Shoes".to_string()]);
        assert!(query.source.brand.is_none());
    }
}
