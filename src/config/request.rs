//! Request-context signal configuration.

use serde::{Deserialize, Serialize};

fn default_id_params() -> Vec<String> {
    ["post", "post_id", "post_ID", "postId"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_referer_params() -> Vec<String> {
    vec!["_wp_http_referer".to_string()]
}

fn default_use_http_referer() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContextConfig {
    /// Synonymous parameter names carrying a content id, in priority order
    #[serde(default = "default_id_params")]
    pub id_params: Vec<String>,

    /// Request parameters whose value is a URL to scan for `id_params`
    #[serde(default = "default_referer_params")]
    pub referer_params: Vec<String>,

    /// Fall back to the invocation's referring URL
    #[serde(default = "default_use_http_referer")]
    pub use_http_referer: bool,
}

impl Default for RequestContextConfig {
    fn default() -> Self {
        Self {
            id_params: default_id_params(),
            referer_params: default_referer_params(),
            use_http_referer: default_use_http_referer(),
        }
    }
}

impl RequestContextConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.id_params.iter().any(|p| p.is_empty()) {
            return Err("request.id_params cannot contain empty names".to_string());
        }
        if self.referer_params.iter().any(|p| p.is_empty()) {
            return Err("request.referer_params cannot contain empty names".to_string());
        }
        Ok(())
    }
}
