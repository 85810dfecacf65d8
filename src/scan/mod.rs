//! Content scan: who references an attachment?
//!
//! Two passes, the second only when the first finds nothing:
//! - reverse references: records whose cover field equals the attachment id,
//!   then records whose gallery lists contain it as a whole entry
//! - free-text scan: record bodies containing block or markup fragments that
//!   embed the id (`wp-image-N`, `"id":N`, ...)
//!
//! The free-text pass is a heuristic. `wp-image-7` also matches inside
//! `wp-image-77`, so results are best-effort.

use tracing::debug;

use crate::config::{ScanConfig, TaxonomyConfig, ID_PLACEHOLDER};
use crate::error::StoreResult;
use crate::resolver::cache::{Detection, DetectionCache};
use crate::resolver::normalizer::Normalizer;
use crate::resolver::ResolvedType;
use crate::store::{ContentQuery, LikePattern, RecordStore};

/// Expand the configured templates for one attachment id into LIKE patterns.
pub fn build_patterns(templates: &[String], attachment_id: u64) -> Vec<LikePattern> {
    let id = attachment_id.to_string();
    templates
        .iter()
        .map(|template| LikePattern::containing(&template.replace(ID_PLACEHOLDER, &id)))
        .collect()
}

/// Pick the owner among referencing records.
///
/// A candidate normalizing to the priority type wins immediately; otherwise
/// the first candidate (in order) that normalizes at all.
pub fn select_preferred(
    candidates: &[u64],
    normalizer: &Normalizer<'_>,
    taxonomy: &TaxonomyConfig,
) -> StoreResult<Option<ResolvedType>> {
    let mut first = None;
    for &candidate in candidates {
        let resolved = match normalizer.normalize(candidate)? {
            Some(resolved) => resolved,
            None => continue,
        };
        if taxonomy.is_priority(resolved.as_str()) {
            return Ok(Some(resolved));
        }
        if first.is_none() {
            first = Some(resolved);
        }
    }
    Ok(first)
}

pub struct ContentScanner<'a> {
    store: &'a dyn RecordStore,
    taxonomy: &'a TaxonomyConfig,
    scan: &'a ScanConfig,
    detections: &'a DetectionCache,
}

impl<'a> ContentScanner<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        taxonomy: &'a TaxonomyConfig,
        scan: &'a ScanConfig,
        detections: &'a DetectionCache,
    ) -> Self {
        Self {
            store,
            taxonomy,
            scan,
            detections,
        }
    }

    /// Owning type of an attachment according to the records that reference
    /// it. Settled outcomes (positive or negative) are memoized; a store
    /// failure leaves the id unresolved.
    pub fn find_owner(&self, attachment_id: u64) -> StoreResult<Option<ResolvedType>> {
        if attachment_id == 0 {
            return Ok(None);
        }

        match self.detections.get(attachment_id) {
            Detection::Confirmed(resolved) => return Ok(Some(resolved)),
            Detection::ConfirmedNone => return Ok(None),
            Detection::Unresolved => {}
        }

        let normalizer = Normalizer::new(self.store, self.taxonomy);

        let mut found = select_preferred(
            &self.referencing_records(attachment_id)?,
            &normalizer,
            self.taxonomy,
        )?;

        if found.is_none() && self.scan.enabled {
            let matches = self.search_bodies(attachment_id)?;
            found = select_preferred(&matches, &normalizer, self.taxonomy)?;
            if let Some(resolved) = &found {
                debug!(
                    attachment_id,
                    candidates = matches.len(),
                    resolved_type = %resolved,
                    "Attachment owner found by free-text scan"
                );
            }
        }

        self.detections.settle(attachment_id, found.clone().into());
        Ok(found)
    }

    /// Cover references first, then gallery references, without duplicates.
    fn referencing_records(&self, attachment_id: u64) -> StoreResult<Vec<u64>> {
        let token = attachment_id.to_string();
        let mut candidates = self
            .store
            .find_by_field(&self.taxonomy.cover_field, &token)?;

        for gallery in &self.taxonomy.gallery_fields {
            if let Some(required) = &gallery.requires_type {
                if !self.store.type_exists(required)? {
                    continue;
                }
            }
            for id in self
                .store
                .find_by_field_token(&gallery.field, &token, gallery.delimiter)?
            {
                if !candidates.contains(&id) {
                    candidates.push(id);
                }
            }
        }

        Ok(candidates)
    }

    fn search_bodies(&self, attachment_id: u64) -> StoreResult<Vec<u64>> {
        let query = ContentQuery {
            patterns: build_patterns(&self.scan.patterns, attachment_id),
            excluded_types: self.scan.excluded_types.clone(),
            excluded_statuses: self.scan.excluded_statuses.clone(),
            limit: self.scan.max_results,
        };
        self.store.search_content(&query)
    }
}
