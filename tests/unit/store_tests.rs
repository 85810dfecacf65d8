// Record store unit tests

use attachment_classifier::store::{
    ContentQuery, ContentRecord, InMemoryStore, LikePattern, RecordStore,
};

fn query(literal: &str, limit: usize) -> ContentQuery {
    ContentQuery {
        patterns: vec![LikePattern::containing(literal)],
        excluded_types: vec!["revision".to_string()],
        excluded_statuses: vec!["trash".to_string()],
        limit,
    }
}

#[test]
fn test_excluded_records_do_not_count_towards_limit() {
    let store = InMemoryStore::new();
    store.insert_record(ContentRecord::new(1, "revision").with_body("wp-image-9"));
    store.insert_record(
        ContentRecord::new(2, "post")
            .with_status("trash")
            .with_body("wp-image-9"),
    );
    store.insert_record(ContentRecord::new(3, "post").with_body("wp-image-9"));
    store.insert_record(ContentRecord::new(4, "page").with_body("wp-image-9"));

    assert_eq!(store.search_content(&query("wp-image-9", 1)).unwrap(), vec![3]);
}

#[test]
fn test_like_metacharacters_in_literal_are_not_wildcards() {
    let store = InMemoryStore::new();
    store.insert_record(ContentRecord::new(1, "post").with_body("100% cotton"));
    store.insert_record(ContentRecord::new(2, "post").with_body("100 percent cotton"));

    assert_eq!(store.search_content(&query("100%", 10)).unwrap(), vec![1]);
}

#[test]
fn test_find_by_field_trims_values() {
    let store = InMemoryStore::new();
    store.insert_record(ContentRecord::new(1, "post").with_meta("_thumbnail_id", " 42 "));
    store.insert_record(ContentRecord::new(2, "post").with_meta("_thumbnail_id", "420"));

    assert_eq!(store.find_by_field("_thumbnail_id", "42").unwrap(), vec![1]);
}

#[test]
fn test_replacing_a_record_keeps_position() {
    let store = InMemoryStore::new();
    store.insert_record(ContentRecord::new(1, "post").with_meta("cover", "9"));
    store.insert_record(ContentRecord::new(2, "page").with_meta("cover", "9"));
    store.insert_record(ContentRecord::new(1, "event").with_meta("cover", "9"));

    assert_eq!(store.find_by_field("cover", "9").unwrap(), vec![1, 2]);
    assert_eq!(store.record(1).unwrap().unwrap().content_type, "event");
}

#[test]
fn test_batch_lookups_skip_missing() {
    let store = InMemoryStore::new();
    store.insert_record(ContentRecord::new(1, "post"));

    let found = store.records(&[1, 2]).unwrap();
    assert_eq!(found.len(), 1);
    assert!(store.attachments(&[1]).unwrap().is_empty());
}
