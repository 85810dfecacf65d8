//! Invocation context: request parameters and referring URL.
//!
//! The resolver reads the current request only through
//! [`InvocationContext`]. Ids follow the platform's lenient integer rules:
//! leading digits count, a sign is dropped, anything else is zero.

use std::collections::HashMap;

use crate::config::RequestContextConfig;

/// Read-only view of the current invocation.
pub trait InvocationContext: Send + Sync {
    /// Scalar request parameter
    fn param(&self, name: &str) -> Option<&str>;

    /// Referring URL of the invocation
    fn referer(&self) -> Option<&str>;
}

/// Owned request context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    params: HashMap<String, String>,
    referer: Option<String>,
}

impl RequestContext {
    /// Context with no parameters and no referer (CLI, cron, tests)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_referer(mut self, url: impl Into<String>) -> Self {
        self.referer = Some(url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.referer.is_none()
    }
}

impl InvocationContext for RequestContext {
    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }
}

/// Parse an id the way the platform does: optional whitespace and sign,
/// then leading digits. Returns 0 when there is nothing usable.
pub fn parse_absint(value: &str) -> u64 {
    let trimmed = value.trim_start();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end].parse().unwrap_or(0)
}

/// Boolean request flag semantics: `1`, `true`, `on`, `yes` are true
/// (case-insensitive); everything else is false.
pub fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Scalar query-string parameters of `url`. Later duplicates win;
/// array-style keys (`name[]`, `name[k]`) are dropped.
pub fn query_params(url: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    let query = match url.split_once('?') {
        Some((_, rest)) => rest.split('#').next().unwrap_or_default(),
        None => return params,
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        if key.is_empty() || key.contains('[') {
            continue;
        }
        params.insert(key, decode_component(raw_value));
    }

    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// First non-zero id found under `names` (in order) in a URL's query string.
pub fn post_id_from_url(url: &str, names: &[String]) -> u64 {
    if url.is_empty() {
        return 0;
    }
    let params = query_params(url);
    first_id(names, |name| params.get(name).map(String::as_str))
}

fn first_id<'a>(names: &[String], lookup: impl Fn(&str) -> Option<&'a str>) -> u64 {
    names
        .iter()
        .filter_map(|name| lookup(name.as_str()))
        .map(parse_absint)
        .find(|id| *id > 0)
        .unwrap_or(0)
}

/// Detect the content id the current invocation is acting on.
///
/// Order: direct request parameters, then referer-carrying parameters,
/// then the invocation's referring URL. Returns 0 when nothing matches.
pub fn detect_post_id(context: &dyn InvocationContext, config: &RequestContextConfig) -> u64 {
    let direct = first_id(&config.id_params, |name| context.param(name));
    if direct > 0 {
        return direct;
    }

    for referer_param in &config.referer_params {
        if let Some(url) = context.param(referer_param) {
            let id = post_id_from_url(url, &config.id_params);
            if id > 0 {
                return id;
            }
        }
    }

    if config.use_http_referer {
        if let Some(url) = context.referer() {
            return post_id_from_url(url, &config.id_params);
        }
    }

    0
}
