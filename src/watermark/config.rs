//! Watermark rule configuration.
//!
//! Rules only carry the fields that decide *whether* a watermark applies to
//! an attachment. Rendering parameters belong to the image pipeline and are
//! not modelled here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_image_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
    ]
}

/// A configured watermark and the attachments it targets.
///
/// ```yaml
/// - name: shop-logo
///   auto_add: true
///   auto_add_all: false
///   image_types: [image/jpeg, image/png]
///   post_types: [product]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRule {
    pub name: String,

    /// Apply automatically when an attachment is uploaded (default: false)
    #[serde(default)]
    pub auto_add: bool,

    /// Apply automatically even when the uploader may not apply watermarks
    #[serde(default)]
    pub auto_add_all: bool,

    /// Allowed MIME types (default: JPEG, PNG, GIF)
    #[serde(default = "default_image_types")]
    pub image_types: Vec<String>,

    /// Allowed owning content types; `unattached` targets orphan uploads
    #[serde(default)]
    pub post_types: Vec<String>,
}

impl WatermarkRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_add: false,
            auto_add_all: false,
            image_types: default_image_types(),
            post_types: Vec::new(),
        }
    }

    pub fn auto(mut self) -> Self {
        self.auto_add = true;
        self
    }

    pub fn for_everyone(mut self) -> Self {
        self.auto_add_all = true;
        self
    }

    pub fn with_image_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_post_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        self.image_types.iter().any(|t| t == mime_type)
    }

    pub fn accepts_post_type(&self, post_type: &str) -> bool {
        self.post_types.iter().any(|t| t == post_type)
    }

    /// Validate the rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Watermark rule 'name' field cannot be empty".to_string());
        }

        if let Some(bad) = self.image_types.iter().find(|t| !t.starts_with("image/")) {
            return Err(format!(
                "Watermark rule '{}': image type '{}' is not an image MIME type",
                self.name, bad
            ));
        }

        if self.post_types.iter().any(|t| t.trim().is_empty()) {
            return Err(format!(
                "Watermark rule '{}': post_types cannot contain empty tags",
                self.name
            ));
        }

        Ok(())
    }
}

/// Validate a rule set: every rule valid, names unique.
pub fn validate_rules(rules: &[WatermarkRule]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for (idx, rule) in rules.iter().enumerate() {
        rule.validate()
            .map_err(|e| format!("Watermark rule {}: {}", idx, e))?;
        if !seen.insert(rule.name.as_str()) {
            return Err(format!("Duplicate watermark rule name '{}'", rule.name));
        }
    }
    Ok(())
}
