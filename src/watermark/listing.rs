//! Bulk listing of attachments to watermark or restore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::ResolverError;
use crate::resolver::ClassificationResolver;
use crate::store::AttachmentSnapshot;

use super::eligibility::rules_for_attachment;
use super::media::available_mime_types;

/// What the batch is about to do with the listed attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Attachments at least one rule applies to
    #[default]
    Watermark,
    /// Attachments with a kept original
    Restore,
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListMode::Watermark => f.write_str("watermark"),
            ListMode::Restore => f.write_str("restore"),
        }
    }
}

impl FromStr for ListMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "watermark" => Ok(ListMode::Watermark),
            "restore" => Ok(ListMode::Restore),
            other => Err(format!(
                "Unknown list mode '{}' (expected watermark or restore)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedAttachment {
    pub id: u64,
    pub title: String,
}

/// An attachment that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingFailure {
    pub id: u64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingOutcome {
    pub items: Vec<ListedAttachment>,
    pub failures: Vec<ListingFailure>,
}

/// List the attachments a bulk action in `mode` would touch.
///
/// # Errors
///
/// Fails only when the attachments cannot be enumerated or loaded. A failure
/// while evaluating one attachment is logged and recorded in
/// [`ListingOutcome::failures`].
pub fn list_candidates(
    resolver: &ClassificationResolver,
    mode: ListMode,
) -> Result<ListingOutcome, ResolverError> {
    let config = resolver.config();
    let store = resolver.store();

    let mime_types = available_mime_types(false, config.media.webp_supported);
    let ids = store.list_attachments(&mime_types)?;

    if ids.is_empty() {
        return Ok(ListingOutcome::default());
    }

    if mode == ListMode::Watermark {
        if let Err(e) = resolver.prime(&ids) {
            warn!(error = %e, "Failed to prime resolver, resolving one by one");
        }
    }

    let attachments = store.attachments(&ids)?;
    let mut outcome = ListingOutcome::default();

    for attachment in &attachments {
        match include(resolver, attachment, mode) {
            Ok(true) => outcome.items.push(ListedAttachment {
                id: attachment.id,
                title: attachment.title.clone(),
            }),
            Ok(false) => {}
            Err(e) => {
                warn!(attachment_id = attachment.id, error = %e, "Skipping attachment");
                outcome.failures.push(ListingFailure {
                    id: attachment.id,
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(
        mode = %mode,
        enumerated = ids.len(),
        listed = outcome.items.len(),
        failed = outcome.failures.len(),
        "Listed candidate attachments"
    );
    Ok(outcome)
}

fn include(
    resolver: &ClassificationResolver,
    attachment: &AttachmentSnapshot,
    mode: ListMode,
) -> Result<bool, ResolverError> {
    if attachment.status == "trash" || attachment.used_as_watermark {
        return Ok(false);
    }

    match mode {
        ListMode::Restore => Ok(attachment.has_backup),
        ListMode::Watermark => Ok(!rules_for_attachment(resolver, attachment)?.is_empty()),
    }
}
