//! Content-type taxonomy configuration.
//!
//! Which tags are variant subtypes (and of what), which type wins ties, and
//! which record fields point back at attachments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_variants() -> BTreeMap<String, String> {
    let mut variants = BTreeMap::new();
    variants.insert("product_variation".to_string(), "product".to_string());
    variants
}

fn default_priority_type() -> Option<String> {
    Some("product".to_string())
}

fn default_cover_field() -> String {
    "_thumbnail_id".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_gallery_fields() -> Vec<GalleryField> {
    vec![GalleryField {
        field: "_product_image_gallery".to_string(),
        delimiter: default_delimiter(),
        requires_type: Some("product".to_string()),
    }]
}

/// A record field holding a delimited list of attachment ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryField {
    pub field: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Only search this field when the given type is registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Variant tag -> parent tag
    #[serde(default = "default_variants")]
    pub variants: BTreeMap<String, String>,

    /// Type preferred when several candidates reference one attachment
    /// (null disables the preference)
    #[serde(default = "default_priority_type")]
    pub priority_type: Option<String>,

    /// Field storing a record's cover image id
    #[serde(default = "default_cover_field")]
    pub cover_field: String,

    #[serde(default = "default_gallery_fields")]
    pub gallery_fields: Vec<GalleryField>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            priority_type: default_priority_type(),
            cover_field: default_cover_field(),
            gallery_fields: default_gallery_fields(),
        }
    }
}

impl TaxonomyConfig {
    /// Parent tag of a variant subtype, `None` for ordinary tags
    pub fn variant_parent(&self, tag: &str) -> Option<&str> {
        self.variants.get(tag).map(String::as_str)
    }

    pub fn is_variant(&self, tag: &str) -> bool {
        self.variants.contains_key(tag)
    }

    pub fn is_priority(&self, tag: &str) -> bool {
        self.priority_type.as_deref() == Some(tag)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (variant, parent) in &self.variants {
            if variant.is_empty() || parent.is_empty() {
                return Err("Taxonomy variant mappings cannot have empty tags".to_string());
            }
            if variant == parent {
                return Err(format!(
                    "Taxonomy variant '{}' cannot map to itself",
                    variant
                ));
            }
            if self.variants.contains_key(parent) {
                return Err(format!(
                    "Taxonomy variant '{}' maps to '{}', which is itself a variant",
                    variant, parent
                ));
            }
        }

        if let Some(priority) = &self.priority_type {
            if priority.is_empty() {
                return Err("priority_type cannot be empty (use null to disable)".to_string());
            }
            if self.is_variant(priority) {
                return Err(format!(
                    "priority_type '{}' is a variant tag and can never be resolved",
                    priority
                ));
            }
        }

        if self.cover_field.is_empty() {
            return Err("cover_field cannot be empty".to_string());
        }

        for (idx, gallery) in self.gallery_fields.iter().enumerate() {
            if gallery.field.is_empty() {
                return Err(format!("Gallery field {} has an empty name", idx));
            }
            if gallery.delimiter.is_ascii_digit() {
                return Err(format!(
                    "Gallery field '{}' uses digit '{}' as delimiter",
                    gallery.field, gallery.delimiter
                ));
            }
        }

        Ok(())
    }
}
