// Request context unit tests

use attachment_classifier::config::RequestContextConfig;
use attachment_classifier::request::{
    detect_post_id, parse_absint, post_id_from_url, query_params, InvocationContext,
    RequestContext,
};

/// Context backed by a fixed slice, to check the trait is the only seam
struct StaticContext {
    params: &'static [(&'static str, &'static str)],
}

impl InvocationContext for StaticContext {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    fn referer(&self) -> Option<&str> {
        None
    }
}

#[test]
fn test_custom_context_implementation() {
    let context = StaticContext {
        params: &[("post_ID", "31"), ("action", "editpost")],
    };
    assert_eq!(detect_post_id(&context, &RequestContextConfig::default()), 31);
}

#[test]
fn test_custom_id_params() {
    let config = RequestContextConfig {
        id_params: vec!["item".to_string()],
        ..RequestContextConfig::default()
    };
    let context = RequestContext::new()
        .with_param("post", "5")
        .with_param("item", "6");
    assert_eq!(detect_post_id(&context, &config), 6);
}

#[test]
fn test_referer_with_encoded_values() {
    let url = "https://site.test/wp-admin/post.php?post=%2042&_wpnonce=a%26b";
    let params = query_params(url);
    assert_eq!(params.get("_wpnonce").map(String::as_str), Some("a&b"));
    assert_eq!(post_id_from_url(url, &["post".to_string()]), 42);
}

#[test]
fn test_later_duplicate_wins() {
    let params = query_params("/x?post=1&post=2");
    assert_eq!(params.get("post").map(String::as_str), Some("2"));
}

#[test]
fn test_absint_matches_lenient_parsing() {
    assert_eq!(parse_absint("17 "), 17);
    assert_eq!(parse_absint("-0"), 0);
    assert_eq!(parse_absint("3.9"), 3);
}

#[test]
fn test_empty_context() {
    let context = RequestContext::new();
    assert!(context.is_empty());
    assert_eq!(context.param("post"), None);
    assert_eq!(context.referer(), None);
}
