// Test harness for integration tests
// Builds stores and resolvers sharing query counters with the test

use attachment_classifier::config::Config;
use attachment_classifier::request::RequestContext;
use attachment_classifier::resolver::ClassificationResolver;
use attachment_classifier::store::InMemoryStore;
use std::sync::Arc;

/// Fixture describing a small shop: products with variants, an article
/// embedding images in its body, and a handful of attachments.
pub const SHOP_FIXTURE: &str = r#"
types: [post, page, article, product, product_variation]
records:
  - id: 10
    type: product
    meta:
      _thumbnail_id: "50"
      _product_image_gallery: "51,52"
  - id: 11
    type: product_variation
    parent_id: 10
    meta:
      _thumbnail_id: "53"
  - id: 20
    type: page
  - id: 900
    type: article
    body: '<figure><img src="a.jpg" class="wp-image-77" /></figure>'
attachments:
  - id: 50
    mime_type: image/jpeg
    title: Hero
  - id: 51
    mime_type: image/jpeg
    title: Gallery one
  - id: 53
    mime_type: image/jpeg
    title: Variant cover
  - id: 60
    mime_type: image/jpeg
    parent_id: 20
    title: Page banner
  - id: 77
    mime_type: image/jpeg
    title: Inline
  - id: 88
    mime_type: image/jpeg
    title: Orphan
  - id: 89
    mime_type: image/jpeg
    title: Old upload
    status: trash
  - id: 90
    mime_type: image/jpeg
    title: Logo
    used_as_watermark: true
  - id: 91
    mime_type: image/jpeg
    title: Marked
    has_backup: true
    parent_id: 20
"#;

pub fn shop_store() -> InMemoryStore {
    InMemoryStore::from_yaml_str(SHOP_FIXTURE).expect("shop fixture should parse")
}

/// Resolver over a clone of `store` (clones share data and counters)
pub fn resolver(store: &InMemoryStore) -> ClassificationResolver {
    resolver_with_config(store, Config::default())
}

pub fn resolver_with_config(store: &InMemoryStore, config: Config) -> ClassificationResolver {
    ClassificationResolver::new(Arc::new(store.clone()), Arc::new(config))
}

pub fn resolver_with_request(
    store: &InMemoryStore,
    context: RequestContext,
) -> ClassificationResolver {
    resolver(store).with_context(Arc::new(context))
}
