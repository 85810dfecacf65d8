// Error types module

use thiserror::Error;

/// Errors raised by a record store query.
///
/// Absent records are never errors; lookups return `Ok(None)` or an empty
/// list for those. Only a failing query (timeout, lost connection) surfaces
/// here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not answer the query at all
    #[error("Record store unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    /// The store answered with data the classifier cannot interpret
    #[error("Malformed record {id}: {reason}")]
    Malformed { id: u64, reason: String },
}

impl StoreError {
    /// Create an unavailable error for a named query
    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by the resolver and its consumers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level error for the binary and fixture loading.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Configuration errors (invalid YAML, missing env vars, failed validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fixture store could not be loaded
    #[error("Store fixture error: {0}")]
    Fixture(String),

    #[error("Attachment {0} not found")]
    AttachmentNotFound(u64),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl From<StoreError> for ClassifierError {
    fn from(err: StoreError) -> Self {
        ClassifierError::Resolver(ResolverError::Store(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
