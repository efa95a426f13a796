//! Immutable rows read from the analytical source table.

use serde::{Deserialize, Serialize};

use super::ImageKey;

/// Bucket label assigned to products whose source bucket is NULL.
pub const DEFAULT_CREATED_BUCKET: &str = "More than 30 Days";

/// Created-date buckets in display order.
pub const CREATED_BUCKET_ORDER: [&str; 4] = [
    "Last 10 Days",
    "11-20 Days",
    "21-30 Days",
    DEFAULT_CREATED_BUCKET,
];

/// One image slot of a product as stored in the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 1-based slot.
    pub image_index: u8,
    /// Image URL. Never empty.
    pub image_url: String,
    /// Aspect ratio label such as `"1:1"`.
    pub aspect_ratio_value: Option<String>,
    /// Link to the 3x4 variant of the image.
    pub meta_3x4: Option<String>,
    /// Whether the storefront hides padding for this image.
    pub hide_padding: Option<bool>,
    /// Image resolution.
    pub dpi: Option<f64>,
    /// Whether the background is white.
    pub white_bg: Option<bool>,
}

/// A product variant with its metadata and image slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
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
    /// Created-date bucket, NULL already mapped to
    /// [`DEFAULT_CREATED_BUCKET`].
    pub created_date_bucket_label: String,
    /// Images ordered by `image_index`; slots without URL are absent.
    pub images: Vec<ImageRecord>,
}

impl ProductRow {
    /// Keys of every image this product carries.
    pub fn image_keys(&self) -> impl Iterator<Item = ImageKey> + '_ {
        self.images
            .iter()
            .map(|img| ImageKey::new(self.product_variant_id.clone(), img.image_index))
    }
}

/// Normalises a nullable bucket label from the source.
#[must_use]
pub fn normalize_bucket(label: Option<String>) -> String {
    label
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_CREATED_BUCKET.to_string())
}

/// Distinct filter values present in the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterValues {
    /// Distinct level-1 categories.
    pub categories: Vec<String>,
    /// Distinct brands.
    pub brands: Vec<String>,
    /// Distinct normalised created-date buckets.
    pub created_date_buckets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_or_empty_bucket_maps_to_default() {
        assert_eq!(normalize_bucket(None), DEFAULT_CREATED_BUCKET);
        assert_eq!(normalize_bucket(Some(String::new())), DEFAULT_CREATED_BUCKET);
        assert_eq!(normalize_bucket(Some("11-20 Days".to_string())), "11-20 Days");
    }
}
