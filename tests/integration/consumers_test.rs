// Consumer integration tests
//
// Tests that verify auto-apply eligibility and bulk listing on top of the
// resolver

use attachment_classifier::config::Config;
use attachment_classifier::request::RequestContext;
use attachment_classifier::store::{AttachmentSnapshot, RecordStore};
use attachment_classifier::watermark::{
    auto_apply_rules, list_candidates, rules_for_attachment, Actor, ListMode, WatermarkRule,
};
use std::sync::Arc;

use super::test_harness::{resolver_with_config, shop_store};

fn shop_rules() -> Config {
    Config {
        rules: vec![
            WatermarkRule::new("shop-logo")
                .auto()
                .with_post_types(["product"]),
            WatermarkRule::new("pages")
                .auto()
                .for_everyone()
                .with_post_types(["page"]),
            WatermarkRule::new("orphans").with_post_types(["unattached"]),
        ],
        ..Config::default()
    }
}

fn rule_names<'a>(rules: impl IntoIterator<Item = &'a WatermarkRule>) -> Vec<&'a str> {
    rules.into_iter().map(|rule| rule.name.as_str()).collect()
}

#[test]
fn test_auto_apply_for_product_upload() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());
    let attachment = store.attachment(50).unwrap().unwrap();

    let rules = auto_apply_rules(&resolver, &attachment, Actor::new(true)).unwrap();
    assert_eq!(rule_names(rules), vec!["shop-logo"]);
}

#[test]
fn test_auto_apply_without_capability() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());
    let product_image = store.attachment(50).unwrap().unwrap();
    let page_image = store.attachment(60).unwrap().unwrap();

    assert!(auto_apply_rules(&resolver, &product_image, Actor::default())
        .unwrap()
        .is_empty());
    assert_eq!(
        rule_names(auto_apply_rules(&resolver, &page_image, Actor::default()).unwrap()),
        vec!["pages"]
    );
}

#[test]
fn test_auto_apply_respects_request_flag() {
    let store = shop_store();
    let attachment = store.attachment(50).unwrap().unwrap();

    for (flag, expected) in [("false", 0), ("no", 0), ("1", 1), ("TRUE", 1)] {
        let resolver = resolver_with_config(&store, shop_rules()).with_context(Arc::new(
            RequestContext::new().with_param("auto_watermark", flag),
        ));
        let rules = auto_apply_rules(&resolver, &attachment, Actor::new(true)).unwrap();
        assert_eq!(rules.len(), expected, "auto_watermark={}", flag);
    }
}

#[test]
fn test_unsupported_format_never_resolves() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());
    let attachment = AttachmentSnapshot::new(50).with_mime_type("image/tiff");

    assert!(auto_apply_rules(&resolver, &attachment, Actor::new(true))
        .unwrap()
        .is_empty());
    assert_eq!(resolver.cache_stats().resolutions.entries, 0);
}

#[test]
fn test_manual_rules_for_orphan() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());
    let attachment = store.attachment(88).unwrap().unwrap();

    assert_eq!(
        rule_names(rules_for_attachment(&resolver, &attachment).unwrap()),
        vec!["orphans"]
    );
}

#[test]
fn test_watermark_listing() {
    // Test: trashed, watermark-source and rule-less attachments are skipped
    let store = shop_store();
    let config = Config {
        rules: vec![WatermarkRule::new("shop").with_post_types(["product", "article"])],
        ..Config::default()
    };
    let resolver = resolver_with_config(&store, config);

    let outcome = list_candidates(&resolver, ListMode::Watermark).unwrap();
    let listed: Vec<(u64, &str)> = outcome
        .items
        .iter()
        .map(|item| (item.id, item.title.as_str()))
        .collect();

    assert_eq!(
        listed,
        vec![
            (50, "Hero"),
            (51, "Gallery one"),
            (53, "Variant cover"),
            (77, "Inline"),
        ]
    );
    assert!(outcome.failures.is_empty());
}

#[test]
fn test_restore_listing() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());

    let outcome = list_candidates(&resolver, ListMode::Restore).unwrap();
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].id, 91);
    assert_eq!(outcome.items[0].title, "Marked");
}

#[test]
fn test_listing_serializes_to_json() {
    let store = shop_store();
    let resolver = resolver_with_config(&store, shop_rules());

    let outcome = list_candidates(&resolver, ListMode::Restore).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["items"][0]["id"], 91);
    assert_eq!(json["items"][0]["title"], "Marked");
    assert_eq!(json["failures"].as_array().map(Vec::len), Some(0));
}
