// Attachment classifier library
//
// Resolves which content type owns a media attachment so that watermark
// rules scoped per content type can be applied.

pub mod config;
pub mod error;
pub mod logging;
pub mod request;
pub mod resolver;
pub mod scan;
pub mod store;
pub mod watermark;

pub use config::Config;
pub use error::{ClassifierError, ResolverError, StoreError};
pub use request::{InvocationContext, RequestContext};
pub use resolver::{ClassificationResolver, ResolvedType, Signal, CASCADE};
pub use store::{AttachmentSnapshot, ContentRecord, InMemoryStore, RecordStore};
