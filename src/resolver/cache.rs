//! Resolver caches
//!
//! This module provides the two caches a resolver instance owns:
//! - `ResolutionCache`: attachment id -> final resolved type, write-once
//! - `DetectionCache`: attachment id -> outcome of the reverse-reference and
//!   content-scan path, including negative results
//!
//! Neither cache expires. Scope is whatever the owner gives them: a resolver
//! built with fresh caches forgets everything when dropped, while caches
//! shared through `Arc` outlive individual resolvers.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ResolvedType;

/// Cache statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Current number of entries
    pub entries: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total requests)
    /// Returns 0.0 if there are no requests
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Statistics for both resolver caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverCacheStats {
    pub resolutions: CacheStats,
    pub detections: CacheStats,
}

/// Hit/miss counters using atomics for thread safety
#[derive(Debug, Default)]
struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsTracker {
    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries as u64,
        }
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Attachment id -> resolved type.
///
/// The first value stored for an id wins; later inserts for the same id are
/// ignored until [`ResolutionCache::clear`].
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<u64, ResolvedType>>,
    stats: StatsTracker,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an id, counting a hit or a miss
    pub fn get(&self, attachment_id: u64) -> Option<ResolvedType> {
        let found = self.entries.read().get(&attachment_id).cloned();
        self.stats.record(found.is_some());
        found
    }

    /// Whether an id is cached, without touching statistics
    pub fn contains(&self, attachment_id: u64) -> bool {
        self.entries.read().contains_key(&attachment_id)
    }

    /// Store a value unless one is already present; returns the value that
    /// is cached after the call.
    pub fn insert(&self, attachment_id: u64, resolved: ResolvedType) -> ResolvedType {
        self.entries
            .write()
            .entry(attachment_id)
            .or_insert(resolved)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.reset();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }
}

/// Outcome of the reverse-reference and content-scan path for one id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "type", rename_all = "snake_case")]
pub enum Detection {
    /// Not scanned yet
    Unresolved,
    /// Scanned, nothing references the attachment
    ConfirmedNone,
    /// Scanned, owned by this type
    Confirmed(ResolvedType),
}

impl Detection {
    /// The detected type when confirmed
    pub fn resolved(&self) -> Option<&ResolvedType> {
        match self {
            Detection::Confirmed(resolved) => Some(resolved),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Detection::Unresolved)
    }
}

impl From<Option<ResolvedType>> for Detection {
    fn from(found: Option<ResolvedType>) -> Self {
        match found {
            Some(resolved) => Detection::Confirmed(resolved),
            None => Detection::ConfirmedNone,
        }
    }
}

/// Attachment id -> [`Detection`], memoizing negative results too.
#[derive(Debug, Default)]
pub struct DetectionCache {
    entries: RwLock<HashMap<u64, Detection>>,
    stats: StatsTracker,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for an id; `Unresolved` when never scanned
    pub fn get(&self, attachment_id: u64) -> Detection {
        let found = self.entries.read().get(&attachment_id).cloned();
        self.stats.record(found.is_some());
        found.unwrap_or(Detection::Unresolved)
    }

    /// Record a settled outcome. `Unresolved` is never stored.
    pub fn settle(&self, attachment_id: u64, detection: Detection) {
        if detection.is_settled() {
            self.entries.write().insert(attachment_id, detection);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.reset();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }
}
