//! Merged read model: source images with their review state applied.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::review::{ImageIssues, ReviewStatus};

/// One image as shown to reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImageView {
    /// 1-based slot.
    pub image_index: u8,
    /// Image URL.
    pub image_url: String,
    /// Aspect ratio label such as `"1:1"`.
    pub aspect_ratio_value: Option<String>,
    /// Link to the 3x4 variant.
    pub meta_3x4: Option<String>,
    /// Padding hidden on the storefront.
    pub hide_padding: Option<bool>,
    /// Image resolution.
    pub dpi: Option<f64>,
    /// White background.
    pub white_bg: Option<bool>,
    /// Effective review status.
    pub review_status: ReviewStatus,
    /// Effective issue flags.
    pub issues: ImageIssues,
    /// Reviewer remark.
    pub remark: Option<String>,
    /// Last writer.
    pub updated_by: Option<String>,
    /// Last write time.
    pub updated_at: Option<DateTime<Utc>>,
}

/// One product variant with merged images and derived status.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductView {
    /// Product variant id.
    pub product_variant_id: String,
    /// Brand.
    pub brand_name: String,
    /// Product display name.
    pub product_name: String,
    /// Level-1 category.
    pub category_name: String,
    /// Level-2 category.
    pub subcategory_name: String,
    /// Level-3 category.
    pub l3_category_name: String,
    /// Normalised created-date bucket.
    pub created_date_bucket_label: String,
    /// `REVIEWED` iff there is at least one image and all are reviewed.
    pub pvid_review_status: ReviewStatus,
    /// Images ordered by slot.
    pub images: Vec<ImageView>,
}

/// Derives the product-level status from its images' statuses.
#[must_use]
pub fn derive_product_status<I>(statuses: I) -> ReviewStatus
where
    I: IntoIterator<Item = ReviewStatus>,
{
    let mut seen_any = false;
    for status in statuses {
        if status != ReviewStatus::Reviewed {
            return ReviewStatus::NotReviewed;
        }
        seen_any = true;
    }
    if seen_any {
        ReviewStatus::Reviewed
    } else {
        ReviewStatus::NotReviewed
    }
}
