//! Composite identifier of a single product image.
//!
//! [`ImageKey`] pairs a product variant id with the 1-based image slot. It
//! is the key of every review-state document and audit event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QcError;

/// Highest image slot the source table carries per product.
pub const MAX_IMAGE_INDEX: u8 = 10;

/// Unique identifier for one image of a product variant.
///
/// Ordering is by `product_variant_id` first, then `image_index`, which is
/// the order images are listed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageKey {
    /// Product variant id (PVID) the image belongs to.
    pub product_variant_id: String,
    /// 1-based image slot within the product.
    pub image_index: u8,
}

impl ImageKey {
    /// Creates a key without validation.
    #[must_use]
    pub fn new(product_variant_id: impl Into<String>, image_index: u8) -> Self {
        Self {
            product_variant_id: product_variant_id.into(),
            image_index,
        }
    }

    /// Creates a key from request input, rejecting an empty PVID or an
    /// image index outside `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRequest`] on invalid input.
    pub fn parse(product_variant_id: &str, image_index: i64) -> Result<Self, QcError> {
        let pvid = product_variant_id.trim();
        if pvid.is_empty() {
            return Err(QcError::InvalidRequest(
                "product_variant_id must not be empty".to_string(),
            ));
        }
        let index = u8::try_from(image_index)
            .ok()
            .filter(|i| (1..=MAX_IMAGE_INDEX).contains(i))
            .ok_or_else(|| {
                QcError::InvalidRequest(format!(
                    "image_index must be between 1 and {MAX_IMAGE_INDEX}, got {image_index}"
                ))
            })?;
        Ok(Self::new(pvid, index))
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.product_variant_id, self.image_index)
    }
}
