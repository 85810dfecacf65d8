// Configuration module

pub mod request;
pub mod scan;
pub mod taxonomy;

pub use request::RequestContextConfig;
pub use scan::{ScanConfig, ID_PLACEHOLDER};
pub use taxonomy::{GalleryField, TaxonomyConfig};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::logging::LoggingConfig;
use crate::watermark::config::{validate_rules, WatermarkRule};

fn default_webp_supported() -> bool {
    true
}

/// Media capabilities of the environment that renders watermarks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// The image backend can decode and encode WebP (default: true)
    #[serde(default = "default_webp_supported")]
    pub webp_supported: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            webp_supported: default_webp_supported(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub request: RequestContextConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub rules: Vec<WatermarkRule>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.taxonomy.validate()?;
        self.request.validate()?;
        self.scan.validate()?;
        self.logging.validate()?;
        validate_rules(&self.rules)?;

        // A rule scoped to a variant tag can never match: resolved types are
        // always normalized to the parent tag.
        for rule in &self.rules {
            if let Some(variant) = rule
                .post_types
                .iter()
                .find(|t| self.taxonomy.is_variant(t))
            {
                return Err(format!(
                    "Watermark rule '{}' targets variant type '{}'; use '{}' instead",
                    rule.name,
                    variant,
                    self.taxonomy.variant_parent(variant).unwrap_or_default()
                ));
            }
        }

        Ok(())
    }
}
