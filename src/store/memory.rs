//! In-memory record store (fixtures, tests, CLI)

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use super::{delimited_token_regex, AttachmentSnapshot, ContentQuery, ContentRecord, RecordStore};
use crate::error::{ClassifierError, StoreError, StoreResult};

/// Serialized form of a store, loadable from YAML or JSON.
///
/// ```yaml
/// types: [post, page, product, product_variation]
/// records:
///   - id: 10
///     type: product
///     meta:
///       _thumbnail_id: "50"
/// attachments:
///   - id: 50
///     mime_type: image/jpeg
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub records: Vec<ContentRecord>,
    #[serde(default)]
    pub attachments: Vec<AttachmentSnapshot>,
}

#[derive(Debug, Default)]
struct StoreData {
    types: BTreeSet<String>,
    records: Vec<ContentRecord>,
    record_index: HashMap<u64, usize>,
    attachments: Vec<AttachmentSnapshot>,
    attachment_index: HashMap<u64, usize>,
}

/// Record store that keeps everything in memory.
///
/// Query results follow insertion order. Every query is counted per
/// operation name, and any operation can be made to fail, so tests can
/// assert on cache behaviour and on error propagation.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<StoreData>>,
    queries: Arc<RwLock<HashMap<&'static str, usize>>>,
    /// Operations that fail with `StoreError::Unavailable`; "*" fails all
    failing: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        let store = Self::new();
        for tag in fixture.types {
            store.register_type(tag);
        }
        for record in fixture.records {
            store.insert_record(record);
        }
        for attachment in fixture.attachments {
            store.insert_attachment(attachment);
        }
        store
    }

    /// Parse a YAML (or JSON) fixture document
    pub fn from_yaml_str(source: &str) -> Result<Self, ClassifierError> {
        let fixture: StoreFixture =
            serde_yaml::from_str(source).map_err(|e| ClassifierError::Fixture(e.to_string()))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::Fixture(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&source)
    }

    pub fn register_type(&self, tag: impl Into<String>) {
        self.data.write().types.insert(tag.into());
    }

    /// Insert or replace a record; its type becomes registered
    pub fn insert_record(&self, record: ContentRecord) {
        let mut data = self.data.write();
        if let Some(tag) = record.type_tag() {
            data.types.insert(tag.to_string());
        }
        match data.record_index.get(&record.id).copied() {
            Some(idx) => data.records[idx] = record,
            None => {
                let idx = data.records.len();
                data.record_index.insert(record.id, idx);
                data.records.push(record);
            }
        }
    }

    /// Insert or replace an attachment snapshot
    pub fn insert_attachment(&self, attachment: AttachmentSnapshot) {
        let mut data = self.data.write();
        match data.attachment_index.get(&attachment.id).copied() {
            Some(idx) => data.attachments[idx] = attachment,
            None => {
                let idx = data.attachments.len();
                data.attachment_index.insert(attachment.id, idx);
                data.attachments.push(attachment);
            }
        }
    }

    /// Make `operation` (or every operation, with "*") fail
    pub fn fail_operation(&self, operation: impl Into<String>) {
        self.failing.write().insert(operation.into());
    }

    pub fn restore_operations(&self) {
        self.failing.write().clear();
    }

    /// Total number of queries answered or attempted
    pub fn query_count(&self) -> usize {
        self.queries.read().values().sum()
    }

    /// Number of queries for one operation
    pub fn queries_for(&self, operation: &str) -> usize {
        self.queries.read().get(operation).copied().unwrap_or(0)
    }

    pub fn reset_query_counts(&self) {
        self.queries.write().clear();
    }

    fn begin(&self, operation: &'static str) -> StoreResult<()> {
        *self.queries.write().entry(operation).or_insert(0) += 1;

        let failing = self.failing.read();
        if failing.contains("*") || failing.contains(operation) {
            return Err(StoreError::unavailable(operation, "simulated outage"));
        }
        Ok(())
    }
}

impl RecordStore for InMemoryStore {
    fn record(&self, id: u64) -> StoreResult<Option<ContentRecord>> {
        self.begin("record")?;
        let data = self.data.read();
        Ok(data
            .record_index
            .get(&id)
            .map(|idx| data.records[*idx].clone()))
    }

    fn attachment(&self, id: u64) -> StoreResult<Option<AttachmentSnapshot>> {
        self.begin("attachment")?;
        let data = self.data.read();
        Ok(data
            .attachment_index
            .get(&id)
            .map(|idx| data.attachments[*idx].clone()))
    }

    fn records(&self, ids: &[u64]) -> StoreResult<Vec<ContentRecord>> {
        self.begin("records")?;
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.record_index.get(id))
            .map(|idx| data.records[*idx].clone())
            .collect())
    }

    fn attachments(&self, ids: &[u64]) -> StoreResult<Vec<AttachmentSnapshot>> {
        self.begin("attachments")?;
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.attachment_index.get(id))
            .map(|idx| data.attachments[*idx].clone())
            .collect())
    }

    fn find_by_field(&self, field: &str, value: &str) -> StoreResult<Vec<u64>> {
        self.begin("find_by_field")?;
        let value = value.trim();
        let data = self.data.read();
        Ok(data
            .records
            .iter()
            .filter(|r| r.meta.get(field).is_some_and(|v| v.trim() == value))
            .map(|r| r.id)
            .collect())
    }

    fn find_by_field_token(
        &self,
        field: &str,
        token: &str,
        delimiter: char,
    ) -> StoreResult<Vec<u64>> {
        self.begin("find_by_field_token")?;
        let re = delimited_token_regex(token, delimiter)
            .map_err(|e| StoreError::unavailable("find_by_field_token", e.to_string()))?;
        let data = self.data.read();
        Ok(data
            .records
            .iter()
            .filter(|r| r.meta.get(field).is_some_and(|v| re.is_match(v)))
            .map(|r| r.id)
            .collect())
    }

    fn search_content(&self, query: &ContentQuery) -> StoreResult<Vec<u64>> {
        self.begin("search_content")?;
        let data = self.data.read();
        Ok(data
            .records
            .iter()
            .filter(|r| query.accepts(r))
            .map(|r| r.id)
            .take(query.limit)
            .collect())
    }

    fn type_exists(&self, tag: &str) -> StoreResult<bool> {
        self.begin("type_exists")?;
        Ok(self.data.read().types.contains(tag))
    }

    fn list_attachments(&self, mime_types: &[String]) -> StoreResult<Vec<u64>> {
        self.begin("list_attachments")?;
        let data = self.data.read();
        Ok(data
            .attachments
            .iter()
            .filter(|a| mime_types.iter().any(|m| *m == a.mime_type))
            .map(|a| a.id)
            .collect())
    }
}
