//! Attachment classification resolver
//!
//! Decides which content type owns an attachment by walking a fixed cascade
//! of ownership signals and stopping at the first confident answer:
//!
//! 1. `DirectParent` - the attachment's own parent link
//! 2. `RequestContext` - the content id the current request is acting on
//! 3. `ReverseReference` - records that reference the attachment (cover,
//!    gallery, then free-text body scan)
//! 4. `StoredContext` - the context label written at upload time
//!
//! When every signal fails the attachment is `unattached`. Every raw id a
//! signal produces goes through the [`Normalizer`], so variant subtypes never
//! leak out. Results are cached per attachment id for the lifetime of the
//! resolver's [`ResolutionCache`].

pub mod cache;
pub mod normalizer;

pub use cache::{CacheStats, Detection, DetectionCache, ResolutionCache, ResolverCacheStats};
pub use normalizer::Normalizer;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::error::{ResolverError, StoreResult};
use crate::request::{detect_post_id, InvocationContext, RequestContext};
use crate::scan::ContentScanner;
use crate::store::{AttachmentSnapshot, RecordStore};

/// Canonical owning type of an attachment. Never empty, never a variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResolvedType(String);

impl ResolvedType {
    /// Label for attachments nothing claims
    pub const UNATTACHED: &'static str = "unattached";

    /// `None` when the label is blank
    pub fn new(label: impl AsRef<str>) -> Option<Self> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            None
        } else {
            Some(Self(label.to_string()))
        }
    }

    pub fn unattached() -> Self {
        Self(Self::UNATTACHED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unattached(&self) -> bool {
        self.0 == Self::UNATTACHED
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResolvedType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResolvedType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One ownership signal of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    DirectParent,
    RequestContext,
    ReverseReference,
    StoredContext,
}

/// Signals in the order they are consulted.
pub const CASCADE: [Signal; 4] = [
    Signal::DirectParent,
    Signal::RequestContext,
    Signal::ReverseReference,
    Signal::StoredContext,
];

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::DirectParent => "direct_parent",
            Signal::RequestContext => "request_context",
            Signal::ReverseReference => "reverse_reference",
            Signal::StoredContext => "stored_context",
        }
    }

    /// Whether the signal reads the attachment record. Only the request
    /// signal runs for an attachment the store does not know.
    pub fn needs_snapshot(&self) -> bool {
        !matches!(self, Signal::RequestContext)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cascading resolver over a record store.
///
/// Cheap to share behind `Arc`; caches are internally synchronized.
pub struct ClassificationResolver {
    store: Arc<dyn RecordStore>,
    config: Arc<Config>,
    context: Arc<dyn InvocationContext>,
    resolutions: Arc<ResolutionCache>,
    detections: Arc<DetectionCache>,
}

impl ClassificationResolver {
    /// Resolver with fresh caches and no request context
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<Config>) -> Self {
        Self {
            store,
            config,
            context: Arc::new(RequestContext::new()),
            resolutions: Arc::new(ResolutionCache::new()),
            detections: Arc::new(DetectionCache::new()),
        }
    }

    /// Resolve against the given request
    pub fn with_context(mut self, context: Arc<dyn InvocationContext>) -> Self {
        self.context = context;
        self
    }

    /// Use caches owned elsewhere (e.g. shared across several resolvers
    /// serving one batch)
    pub fn with_caches(
        mut self,
        resolutions: Arc<ResolutionCache>,
        detections: Arc<DetectionCache>,
    ) -> Self {
        self.resolutions = resolutions;
        self.detections = detections;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn context(&self) -> &dyn InvocationContext {
        self.context.as_ref()
    }

    /// Owning type of attachment `attachment_id`.
    ///
    /// `snapshot` saves a store lookup when the caller already holds the
    /// attachment. A cached id returns its cached type even when a different
    /// snapshot is passed. Id 0 is resolved from the request only and never
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Store`] when the store cannot answer; nothing
    /// is cached in that case.
    pub fn resolve(
        &self,
        attachment_id: u64,
        snapshot: Option<&AttachmentSnapshot>,
    ) -> Result<ResolvedType, ResolverError> {
        if attachment_id > 0 {
            if let Some(cached) = self.resolutions.get(attachment_id) {
                debug!(attachment_id, resolved_type = %cached, "Resolution cache hit");
                return Ok(cached);
            }
        }

        let loaded: Option<AttachmentSnapshot>;
        let snapshot = match snapshot {
            Some(snapshot) => Some(snapshot),
            None if attachment_id > 0 => {
                loaded = self.store.attachment(attachment_id)?;
                loaded.as_ref()
            }
            None => None,
        };

        let resolved = self.run_cascade(attachment_id, snapshot)?;

        if attachment_id == 0 {
            return Ok(resolved);
        }
        Ok(self.resolutions.insert(attachment_id, resolved))
    }

    /// Resolve by id, loading the attachment from the store
    pub fn resolve_id(&self, attachment_id: u64) -> Result<ResolvedType, ResolverError> {
        self.resolve(attachment_id, None)
    }

    /// Warm the resolution cache for a batch.
    ///
    /// Loads the attachments and their parent records in two batch queries
    /// and caches every attachment whose parent link settles it. Returns the
    /// number of newly cached ids.
    pub fn prime(&self, attachment_ids: &[u64]) -> Result<usize, ResolverError> {
        let mut seen = HashSet::new();
        let pending: Vec<u64> = attachment_ids
            .iter()
            .copied()
            .filter(|id| *id > 0 && !self.resolutions.contains(*id) && seen.insert(*id))
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let attachments = self.store.attachments(&pending)?;

        let mut parent_ids: Vec<u64> = attachments
            .iter()
            .map(|attachment| attachment.parent_id)
            .filter(|parent_id| *parent_id > 0)
            .collect();
        parent_ids.sort_unstable();
        parent_ids.dedup();

        let parents: HashMap<u64, _> = self
            .store
            .records(&parent_ids)?
            .into_iter()
            .map(|record| (record.id, record))
            .collect();

        let normalizer = self.normalizer();
        let mut primed = 0;
        for attachment in &attachments {
            let parent = match parents.get(&attachment.parent_id) {
                Some(parent) => parent,
                None => continue,
            };
            if let Some(resolved) = normalizer.normalize_record(parent)? {
                self.resolutions.insert(attachment.id, resolved);
                primed += 1;
            }
        }

        debug!(
            requested = attachment_ids.len(),
            loaded = attachments.len(),
            primed,
            "Primed resolution cache"
        );
        Ok(primed)
    }

    /// Forget every cached resolution and detection
    pub fn clear_cache(&self) {
        self.resolutions.clear();
        self.detections.clear();
    }

    pub fn cache_stats(&self) -> ResolverCacheStats {
        ResolverCacheStats {
            resolutions: self.resolutions.stats(),
            detections: self.detections.stats(),
        }
    }

    fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(self.store.as_ref(), &self.config.taxonomy)
    }

    fn run_cascade(
        &self,
        attachment_id: u64,
        snapshot: Option<&AttachmentSnapshot>,
    ) -> Result<ResolvedType, ResolverError> {
        for signal in CASCADE {
            if signal.needs_snapshot() && snapshot.is_none() {
                continue;
            }
            if let Some(resolved) = self.extract(signal, attachment_id, snapshot)? {
                debug!(
                    attachment_id,
                    signal = signal.name(),
                    resolved_type = %resolved,
                    "Attachment type resolved"
                );
                return Ok(resolved);
            }
        }

        debug!(attachment_id, "No ownership signal, attachment is unattached");
        Ok(ResolvedType::unattached())
    }

    fn extract(
        &self,
        signal: Signal,
        attachment_id: u64,
        snapshot: Option<&AttachmentSnapshot>,
    ) -> StoreResult<Option<ResolvedType>> {
        let normalizer = self.normalizer();

        match (signal, snapshot) {
            (Signal::DirectParent, Some(snapshot)) => normalizer.normalize(snapshot.parent_id),
            (Signal::RequestContext, _) => {
                let post_id = detect_post_id(self.context.as_ref(), &self.config.request);
                if post_id > 0 {
                    debug!(attachment_id, post_id, "Request names a content id");
                }
                normalizer.normalize(post_id)
            }
            (Signal::ReverseReference, Some(_)) => ContentScanner::new(
                self.store.as_ref(),
                &self.config.taxonomy,
                &self.config.scan,
                &self.detections,
            )
            .find_owner(attachment_id),
            (Signal::StoredContext, Some(snapshot)) => match snapshot.context_label() {
                Some(label) => {
                    if self.store.type_exists(label)? {
                        Ok(ResolvedType::new(normalizer.collapse(label)))
                    } else {
                        Ok(None)
                    }
                }
                None => Ok(None),
            },
            (_, None) => Ok(None),
        }
    }
}
