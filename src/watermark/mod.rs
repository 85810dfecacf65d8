//! Watermark rule selection.
//!
//! Consumers of the classification resolver: deciding which rules apply to
//! an upload, and listing attachments for bulk watermark or restore runs.
//! Pixel work happens elsewhere.
//!
//! # Configuration Example
//!
//! ```yaml
//! rules:
//!   - name: shop-logo
//!     auto_add: true
//!     image_types: [image/jpeg, image/png]
//!     post_types: [product]
//!   - name: orphans
//!     post_types: [unattached]
//! ```

pub mod config;
pub mod eligibility;
pub mod listing;
pub mod media;

// Re-export main types for convenience
pub use config::{validate_rules, WatermarkRule};
pub use eligibility::{auto_apply_enabled, auto_apply_rules, rules_for_attachment, Actor};
pub use listing::{list_candidates, ListMode, ListedAttachment, ListingFailure, ListingOutcome};
pub use media::{available_formats, available_mime_types, MediaFormat};
