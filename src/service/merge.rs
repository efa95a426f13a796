//! Joins source products with review-state documents.
//!
//! Missing documents are not errors: the image simply takes the default
//! [`ReviewState`].

use std::collections::HashMap;

use crate::domain::product::derive_product_status;
use crate::domain::{ImageKey, ImageView, ProductRow, ProductView, ReviewState};

/// Returns the keys of every image across `rows`, in row order.
#[must_use]
pub fn collect_keys(rows: &[ProductRow]) -> Vec<ImageKey> {
    rows.iter().flat_map(ProductRow::image_keys).collect()
}

/// Merges one product with whatever review documents exist for its
/// images and derives the product-level status.
#[must_use]
pub fn merge_product(row: ProductRow, states: &HashMap<ImageKey, ReviewState>) -> ProductView {
    let default_state = ReviewState::default();
    let images: Vec<ImageView> = row
        .images
        .into_iter()
        .map(|img| {
            let key = ImageKey::new(row.product_variant_id.clone(), img.image_index);
            let state = states.get(&key).unwrap_or(&default_state);
            ImageView {
                image_index: img.image_index,
                image_url: img.image_url,
                aspect_ratio_value: img.aspect_ratio_value,
                meta_3x4: img.meta_3x4,
                hide_padding: img.hide_padding,
                dpi: img.dpi,
                white_bg: img.white_bg,
                review_status: state.status,
                issues: state.issues,
                remark: state.remark.clone(),
                updated_by: state.updated_by.clone(),
                updated_at: state.updated_at,
            }
        })
        .collect();

    ProductView {
        pvid_review_status: derive_product_status(images.iter().map(|i| i.review_status)),
        product_variant_id: row.product_variant_id,
        brand_name: row.brand_name,
        product_name: row.product_name,
        category_name: row.category_name,
        subcategory_name: row.subcategory_name,
        l3_category_name: row.l3_category_name,
        created_date_bucket_label: row.created_date_bucket_label,
        images,
    }
}

/// Merges every row in order.
#[must_use]
pub fn merge_products(
    rows: Vec<ProductRow>,
    states: &HashMap<ImageKey, ReviewState>,
) -> Vec<ProductView> {
    rows.into_iter().map(|r| merge_product(r, states)).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{IssueKey, ReviewStatus};
    use crate::store::memory::tests::product;

    #[test]
    fn images_without_documents_take_defaults() {
        let merged = merge_product(product("PV-1", "Acme", 2), &HashMap::new());
        assert_eq!(merged.images.len(), 2);
        for image in &merged.images {
            assert_eq!(image.review_status, ReviewStatus::NotReviewed);
            assert!(!image.issues.any());
            assert!(image.remark.is_none());
        }
        assert_eq!(merged.pvid_review_status, ReviewStatus::NotReviewed);
    }

    #[test]
    fn product_is_reviewed_only_when_every_image_is() {
        let mut states = HashMap::new();
        let reviewed = ReviewState {
            status: ReviewStatus::Reviewed,
            ..ReviewState::default()
        };
        states.insert(ImageKey::new("PV-1", 1), reviewed.clone());
        let partial = merge_product(product("PV-1", "Acme", 2), &states);
        assert_eq!(partial.pvid_review_status, ReviewStatus::NotReviewed);

        states.insert(ImageKey::new("PV-1", 2), reviewed);
        let full = merge_product(product("PV-1", "Acme", 2), &states);
        assert_eq!(full.pvid_review_status, ReviewStatus::Reviewed);
    }

    #[test]
    fn product_without_images_is_not_reviewed() {
        let merged = merge_product(product("PV-0", "Acme", 0), &HashMap::new());
        assert!(merged.images.is_empty());
        assert_eq!(merged.pvid_review_status, ReviewStatus::NotReviewed);
    }

    #[test]
    fn state_fields_are_copied_onto_images() {
        let mut state = ReviewState {
            remark: Some("check crop".to_string()),
            updated_by: Some("r@example.com".to_string()),
            ..ReviewState::default()
        };
        state.issues.set(IssueKey::CroppedImage, true);
        let mut states = HashMap::new();
        states.insert(ImageKey::new("PV-1", 1), state);

        let merged = merge_product(product("PV-1", "Acme", 1), &states);
        let Some(image) = merged.images.first() else {
            panic!("expected one image");
        };
        assert!(image.issues.cropped_image);
        assert_eq!(image.remark.as_deref(), Some("check crop"));
        assert_eq!(image.updated_by.as_deref(), Some("r@example.com"));
    }

    #[test]
    fn collect_keys_covers_every_image() {
        let rows = vec![product("A", "Acme", 2), product("B", "Acme", 1)];
        assert_eq!(
            collect_keys(&rows),
            vec![
                ImageKey::new("A", 1),
                ImageKey::new("A", 2),
                ImageKey::new("B", 1)
            ]
        );
    }
}
