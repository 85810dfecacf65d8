//! Reference-id normalization.
//!
//! Maps the id of a referencing record to the type label rules are written
//! against. Variant subtypes take their parent record's type; when the
//! parent is gone they collapse to the configured parent tag.

use crate::config::TaxonomyConfig;
use crate::error::StoreResult;
use crate::store::{ContentRecord, RecordStore};

use super::ResolvedType;

pub struct Normalizer<'a> {
    store: &'a dyn RecordStore,
    taxonomy: &'a TaxonomyConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(store: &'a dyn RecordStore, taxonomy: &'a TaxonomyConfig) -> Self {
        Self { store, taxonomy }
    }

    /// Canonical type of record `content_id`; `None` for id 0, a missing
    /// record or an untyped one.
    pub fn normalize(&self, content_id: u64) -> StoreResult<Option<ResolvedType>> {
        if content_id == 0 {
            return Ok(None);
        }
        match self.store.record(content_id)? {
            Some(record) => self.normalize_record(&record),
            None => Ok(None),
        }
    }

    /// Same as [`Normalizer::normalize`] for a record already in hand.
    pub fn normalize_record(&self, record: &ContentRecord) -> StoreResult<Option<ResolvedType>> {
        let tag = match record.type_tag() {
            Some(tag) => tag,
            None => return Ok(None),
        };

        if !self.taxonomy.is_variant(tag) {
            return Ok(ResolvedType::new(tag));
        }

        let parent_tag = match record.parent_id {
            0 => None,
            parent_id => self
                .store
                .record(parent_id)?
                .and_then(|parent| parent.type_tag().map(str::to_string)),
        };

        let label = parent_tag.unwrap_or_else(|| tag.to_string());
        Ok(ResolvedType::new(self.collapse(&label)))
    }

    /// Replace a variant tag by its configured parent tag
    pub fn collapse<'t>(&'t self, tag: &'t str) -> &'t str {
        self.taxonomy.variant_parent(tag).unwrap_or(tag)
    }
}
