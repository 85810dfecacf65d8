// Error scenario tests
//
// A failing record store must surface as an error, never as `unattached`,
// and must leave no cached state behind

use attachment_classifier::error::{ResolverError, StoreError};
use attachment_classifier::store::RecordStore;
use attachment_classifier::watermark::{list_candidates, ListMode, WatermarkRule};
use attachment_classifier::Config;
use rstest::rstest;

use super::test_harness::{resolver, resolver_with_config, shop_store};

#[rstest]
#[case("attachment", 50)]
#[case("find_by_field", 50)]
#[case("type_exists", 51)]
#[case("find_by_field_token", 51)]
#[case("search_content", 77)]
#[case("record", 60)]
fn test_store_failure_propagates(#[case] operation: &str, #[case] attachment_id: u64) {
    let store = shop_store();
    store.fail_operation(operation);
    let resolver = resolver(&store);

    let err = resolver.resolve_id(attachment_id).unwrap_err();
    match err {
        ResolverError::Store(StoreError::Unavailable {
            operation: failed, ..
        }) => assert_eq!(failed, operation),
        other => panic!("unexpected error: {:?}", other),
    }

    let stats = resolver.cache_stats();
    assert_eq!(stats.resolutions.entries, 0);
    assert_eq!(stats.detections.entries, 0);
}

#[test]
fn test_recovers_after_outage() {
    let store = shop_store();
    let resolver = resolver(&store);

    store.fail_operation("*");
    assert!(resolver.resolve_id(77).is_err());

    store.restore_operations();
    assert_eq!(resolver.resolve_id(77).unwrap(), "article");
}

#[test]
fn test_prime_failure_is_reported() {
    let store = shop_store();
    store.fail_operation("records");
    let resolver = resolver(&store);

    assert!(resolver.prime(&[60, 91]).is_err());
    assert_eq!(resolver.cache_stats().resolutions.entries, 0);
}

#[test]
fn test_listing_isolates_item_failures() {
    // Test: an outage of the body search fails only the attachments that
    // need it
    let store = shop_store();
    store.fail_operation("search_content");
    let config = Config {
        rules: vec![WatermarkRule::new("all")
            .with_post_types(["product", "page", "article", "unattached"])],
        ..Config::default()
    };
    let resolver = resolver_with_config(&store, config);

    let outcome = list_candidates(&resolver, ListMode::Watermark).unwrap();
    let listed: Vec<u64> = outcome.items.iter().map(|item| item.id).collect();
    let failed: Vec<u64> = outcome.failures.iter().map(|failure| failure.id).collect();

    assert_eq!(listed, vec![50, 51, 53, 60, 91]);
    assert_eq!(failed, vec![77, 88]);
    assert!(outcome.failures[0].error.contains("search_content"));
}

#[test]
fn test_listing_fails_when_enumeration_fails() {
    let store = shop_store();
    store.fail_operation("attachments");
    let resolver = resolver(&store);

    assert!(list_candidates(&resolver, ListMode::Restore).is_err());
    // The store itself stays usable for point lookups
    assert!(store.attachment(50).unwrap().is_some());
}
