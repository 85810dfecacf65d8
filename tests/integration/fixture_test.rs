// Fixture and configuration file tests
//
// Tests that load configuration and store fixtures from disk the way the
// binary does

use attachment_classifier::config::Config;
use attachment_classifier::error::ClassifierError;
use attachment_classifier::logging::LogFormat;
use attachment_classifier::store::{InMemoryStore, RecordStore};
use std::io::Write;
use tempfile::NamedTempFile;

use super::test_harness::{resolver_with_config, SHOP_FIXTURE};

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_store_fixture_from_yaml_file() {
    let file = write_temp(SHOP_FIXTURE);
    let store = InMemoryStore::from_file(file.path()).unwrap();

    assert!(store.type_exists("product_variation").unwrap());
    assert_eq!(store.record(11).unwrap().unwrap().parent_id, 10);
    assert!(store.attachment(90).unwrap().unwrap().used_as_watermark);
}

#[test]
fn test_store_fixture_from_json_file() {
    let json = r#"{
        "records": [{"id": 3, "type": "event", "meta": {"_thumbnail_id": "30"}}],
        "attachments": [{"id": 30, "mime_type": "image/png"}]
    }"#;
    let file = write_temp(json);
    let store = InMemoryStore::from_file(file.path()).unwrap();

    let resolver = resolver_with_config(&store, Config::default());
    assert_eq!(resolver.resolve_id(30).unwrap(), "event");
}

#[test]
fn test_missing_fixture_is_reported() {
    let err = InMemoryStore::from_file("/nonexistent/store.yaml").unwrap_err();
    assert!(matches!(err, ClassifierError::Fixture(_)));
}

#[test]
fn test_malformed_fixture_is_reported() {
    let file = write_temp("records: {not: a list}");
    let err = InMemoryStore::from_file(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Store fixture error"));
}

#[test]
fn test_full_config_file() {
    let file = write_temp(
        r#"
taxonomy:
  variants:
    product_variation: product
  priority_type: product
  cover_field: _thumbnail_id
  gallery_fields:
    - field: _product_image_gallery
      delimiter: ","
      requires_type: product
request:
  id_params: [post, post_id]
  referer_params: [_wp_http_referer]
  use_http_referer: false
scan:
  enabled: true
  max_results: 20
  patterns: ["wp-image-{id}"]
media:
  webp_supported: false
rules:
  - name: shop-logo
    auto_add: true
    image_types: [image/jpeg]
    post_types: [product]
logging:
  level: debug
  format: json
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.request.id_params, vec!["post", "post_id"]);
    assert!(!config.request.use_http_referer);
    assert_eq!(config.scan.max_results, 20);
    assert_eq!(config.scan.patterns.len(), 1);
    assert!(!config.media.webp_supported);
    assert_eq!(config.logging.format, LogFormat::Json);

    // Defaults not named in the file survive
    assert_eq!(config.scan.excluded_types, vec!["revision", "attachment"]);
}

#[test]
fn test_invalid_config_is_rejected_by_validate() {
    let file = write_temp(
        r#"
scan:
  patterns: ["wp-image-"]
"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().unwrap_err().contains("{id}"));
}
