//! Content-scan configuration.
//!
//! Pattern templates use `{id}` as the attachment id placeholder.

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the attachment id in pattern templates
pub const ID_PLACEHOLDER: &str = "{id}";

fn default_enabled() -> bool {
    true
}

fn default_max_results() -> usize {
    50
}

fn default_excluded_types() -> Vec<String> {
    vec!["revision".to_string(), "attachment".to_string()]
}

fn default_excluded_statuses() -> Vec<String> {
    vec!["trash".to_string(), "auto-draft".to_string()]
}

fn default_patterns() -> Vec<String> {
    [
        "\"id\":{id}",
        "\"attachmentId\":{id}",
        "wp-image-{id}",
        "data-id=\"{id}\"",
        "data-attachment-id=\"{id}\"",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Enable the free-text body scan (reverse references are always searched)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cap on records returned by one body search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_excluded_types")]
    pub excluded_types: Vec<String>,

    #[serde(default = "default_excluded_statuses")]
    pub excluded_statuses: Vec<String>,

    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_results: default_max_results(),
            excluded_types: default_excluded_types(),
            excluded_statuses: default_excluded_statuses(),
            patterns: default_patterns(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_results == 0 {
            return Err("scan.max_results must be greater than 0".to_string());
        }

        for (idx, pattern) in self.patterns.iter().enumerate() {
            if !pattern.contains(ID_PLACEHOLDER) {
                return Err(format!(
                    "scan.patterns[{}] '{}' does not contain the {} placeholder",
                    idx, pattern, ID_PLACEHOLDER
                ));
            }
        }

        Ok(())
    }
}
