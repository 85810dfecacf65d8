//! Record store query interface
//!
//! The classifier never owns content. Everything it knows about records and
//! attachments comes through the read-only [`RecordStore`] trait defined here:
//! - point lookups (record, attachment, and batch variants)
//! - reverse lookups by field value or by delimited-list token
//! - bounded LIKE-style body search
//! - registered type checks and attachment enumeration
//!
//! Absent data is `Ok(None)` / an empty list. `Err` is reserved for a store
//! that cannot answer.

pub mod memory;

pub use memory::InMemoryStore;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreResult;

fn default_attachment_status() -> String {
    "inherit".to_string()
}

fn default_record_status() -> String {
    "publish".to_string()
}

/// A tagged unit of content that may reference attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,

    /// Content-type tag; empty when the record is untyped
    #[serde(rename = "type", default)]
    pub content_type: String,

    /// Owning record for variant subtypes (0 = none)
    #[serde(default)]
    pub parent_id: u64,

    #[serde(default = "default_record_status")]
    pub status: String,

    /// Raw body text, searched by the content scan
    #[serde(default)]
    pub body: String,

    /// Field map (cover image id, gallery lists, ...)
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ContentRecord {
    pub fn new(id: u64, content_type: impl Into<String>) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            parent_id: 0,
            status: default_record_status(),
            body: String::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// The type tag, or `None` for an untyped record
    pub fn type_tag(&self) -> Option<&str> {
        let tag = self.content_type.trim();
        if tag.is_empty() {
            None
        } else {
            Some(tag)
        }
    }
}

/// In-memory snapshot of an attachment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSnapshot {
    pub id: u64,

    /// Direct parent link (0 = unattached)
    #[serde(default)]
    pub parent_id: u64,

    #[serde(default = "default_attachment_status")]
    pub status: String,

    /// Stored context label written at upload time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub title: String,

    /// The image is itself a watermark source
    #[serde(default)]
    pub used_as_watermark: bool,

    /// An unmarked original has been kept aside
    #[serde(default)]
    pub has_backup: bool,
}

impl AttachmentSnapshot {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            parent_id: 0,
            status: default_attachment_status(),
            context: None,
            mime_type: "image/jpeg".to_string(),
            title: String::new(),
            used_as_watermark: false,
            has_backup: false,
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn used_as_watermark(mut self) -> Self {
        self.used_as_watermark = true;
        self
    }

    pub fn with_backup(mut self) -> Self {
        self.has_backup = true;
        self
    }

    /// Stored context label, if non-blank
    pub fn context_label(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

/// A LIKE pattern using `%` (any run), `_` (any single char) and `\` as the
/// escape character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikePattern(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Any,
    One,
    Literal(char),
}

impl LikePattern {
    /// Wrap a raw pattern string (already escaped)
    pub fn raw(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern matching any text that contains `literal` verbatim
    pub fn containing(literal: &str) -> Self {
        Self(format!("%{}%", escape_like(literal)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn tokens(&self) -> Vec<LikeToken> {
        let mut tokens = Vec::with_capacity(self.0.len());
        let mut chars = self.0.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => tokens.push(LikeToken::Any),
                '_' => tokens.push(LikeToken::One),
                '\\' => match chars.next() {
                    Some(escaped) => tokens.push(LikeToken::Literal(escaped)),
                    None => tokens.push(LikeToken::Literal('\\')),
                },
                other => tokens.push(LikeToken::Literal(other)),
            }
        }
        tokens
    }

    /// Evaluate the pattern against `text` the way a database LIKE would.
    pub fn matches(&self, text: &str) -> bool {
        let tokens = self.tokens();
        let text: Vec<char> = text.chars().collect();

        let (mut t, mut s) = (0usize, 0usize);
        let mut backtrack: Option<(usize, usize)> = None;

        while s < text.len() {
            match tokens.get(t) {
                Some(LikeToken::One) => {
                    t += 1;
                    s += 1;
                }
                Some(LikeToken::Literal(c)) if *c == text[s] => {
                    t += 1;
                    s += 1;
                }
                Some(LikeToken::Any) => {
                    backtrack = Some((t, s));
                    t += 1;
                }
                _ => match backtrack {
                    Some((star, consumed)) => {
                        t = star + 1;
                        s = consumed + 1;
                        backtrack = Some((star, consumed + 1));
                    }
                    None => return false,
                },
            }
        }

        tokens[t.min(tokens.len())..]
            .iter()
            .all(|token| *token == LikeToken::Any)
    }
}

/// Escape LIKE metacharacters so `literal` only matches itself.
pub fn escape_like(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Regex matching `token` as a whole entry of a `delimiter`-separated list.
///
/// `(^|,)123(,|$)` matches `"12,123,45"` but neither `12` nor `1234` does.
pub fn delimited_token_regex(token: &str, delimiter: char) -> Result<Regex, regex::Error> {
    let delimiter = regex::escape(&delimiter.to_string());
    Regex::new(&format!(
        "(^|{delim}){token}({delim}|$)",
        delim = delimiter,
        token = regex::escape(token)
    ))
}

/// Bounded body search across non-transient records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    /// A record matches when its body matches any pattern
    pub patterns: Vec<LikePattern>,
    pub excluded_types: Vec<String>,
    pub excluded_statuses: Vec<String>,
    pub limit: usize,
}

impl ContentQuery {
    /// Whether a record is eligible and its body matches
    pub fn accepts(&self, record: &ContentRecord) -> bool {
        if self.excluded_types.iter().any(|t| *t == record.content_type) {
            return false;
        }
        if self.excluded_statuses.iter().any(|s| *s == record.status) {
            return false;
        }
        self.patterns.iter().any(|p| p.matches(&record.body))
    }
}

/// Read-only query interface over the platform's record store.
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore: Send + Sync {
    /// Point lookup of a content record
    fn record(&self, id: u64) -> StoreResult<Option<ContentRecord>>;

    /// Point lookup of an attachment snapshot
    fn attachment(&self, id: u64) -> StoreResult<Option<AttachmentSnapshot>>;

    /// Batch lookup; missing ids are omitted
    fn records(&self, ids: &[u64]) -> StoreResult<Vec<ContentRecord>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.record(*id)? {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// Batch lookup; missing ids are omitted
    fn attachments(&self, ids: &[u64]) -> StoreResult<Vec<AttachmentSnapshot>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(attachment) = self.attachment(*id)? {
                found.push(attachment);
            }
        }
        Ok(found)
    }

    /// Distinct ids of records whose `field` equals `value`, in store order
    fn find_by_field(&self, field: &str, value: &str) -> StoreResult<Vec<u64>>;

    /// Distinct ids of records whose delimited `field` list contains `token`
    /// as a whole entry, in store order
    fn find_by_field_token(&self, field: &str, token: &str, delimiter: char)
        -> StoreResult<Vec<u64>>;

    /// Distinct ids of records accepted by `query`, at most `query.limit`
    fn search_content(&self, query: &ContentQuery) -> StoreResult<Vec<u64>>;

    /// Whether `tag` is a registered content type
    fn type_exists(&self, tag: &str) -> StoreResult<bool>;

    /// Ids of attachments whose MIME type is in `mime_types`
    fn list_attachments(&self, mime_types: &[String]) -> StoreResult<Vec<u64>>;
}
