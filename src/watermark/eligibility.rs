//! Which watermark rules apply to an attachment.
//!
//! Automatic application after upload checks, per rule and in this order:
//! the rule auto-applies, the actor may apply watermarks (or the rule does
//! not care), the MIME type is accepted, the owning type is accepted. The
//! resolver only runs once the cheap checks pass, and at most once per call.

use tracing::debug;

use crate::error::ResolverError;
use crate::request::{parse_bool_flag, InvocationContext};
use crate::resolver::{ClassificationResolver, ResolvedType};
use crate::store::AttachmentSnapshot;

use super::config::WatermarkRule;

/// Request flag that switches automatic application off when false
pub const AUTO_WATERMARK_PARAM: &str = "auto_watermark";

/// The user on whose behalf attachments are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    /// Holds the capability to apply watermarks
    pub can_apply_watermark: bool,
}

impl Actor {
    pub fn new(can_apply_watermark: bool) -> Self {
        Self {
            can_apply_watermark,
        }
    }
}

/// Automatic application is on unless the request sets the flag to a false
/// value.
pub fn auto_apply_enabled(context: &dyn InvocationContext) -> bool {
    context
        .param(AUTO_WATERMARK_PARAM)
        .map(parse_bool_flag)
        .unwrap_or(true)
}

/// Resolves the owning type on first use only.
struct LazyType<'a> {
    resolver: &'a ClassificationResolver,
    attachment: &'a AttachmentSnapshot,
    resolved: Option<ResolvedType>,
}

impl<'a> LazyType<'a> {
    fn new(resolver: &'a ClassificationResolver, attachment: &'a AttachmentSnapshot) -> Self {
        Self {
            resolver,
            attachment,
            resolved: None,
        }
    }

    fn get(&mut self) -> Result<&ResolvedType, ResolverError> {
        let resolved = match self.resolved.take() {
            Some(resolved) => resolved,
            None => self
                .resolver
                .resolve(self.attachment.id, Some(self.attachment))?,
        };
        Ok(self.resolved.insert(resolved))
    }
}

/// Rules to apply automatically to a freshly uploaded attachment.
pub fn auto_apply_rules<'r>(
    resolver: &'r ClassificationResolver,
    attachment: &AttachmentSnapshot,
    actor: Actor,
) -> Result<Vec<&'r WatermarkRule>, ResolverError> {
    if !auto_apply_enabled(resolver.context()) {
        debug!(
            attachment_id = attachment.id,
            "Automatic watermarking disabled by request"
        );
        return Ok(Vec::new());
    }

    let mut owner = LazyType::new(resolver, attachment);
    let mut applicable = Vec::new();

    for rule in &resolver.config().rules {
        if !rule.auto_add {
            continue;
        }
        if !rule.auto_add_all && !actor.can_apply_watermark {
            continue;
        }
        if !rule.accepts_mime_type(&attachment.mime_type) {
            continue;
        }
        if !rule.accepts_post_type(owner.get()?.as_str()) {
            continue;
        }
        applicable.push(rule);
    }

    debug!(
        attachment_id = attachment.id,
        rules = applicable.len(),
        "Evaluated automatic watermark rules"
    );
    Ok(applicable)
}

/// Rules an administrator may apply manually: format and owning type only.
pub fn rules_for_attachment<'r>(
    resolver: &'r ClassificationResolver,
    attachment: &AttachmentSnapshot,
) -> Result<Vec<&'r WatermarkRule>, ResolverError> {
    let mut owner = LazyType::new(resolver, attachment);
    let mut applicable = Vec::new();

    for rule in &resolver.config().rules {
        if rule.accepts_mime_type(&attachment.mime_type)
            && rule.accepts_post_type(owner.get()?.as_str())
        {
            applicable.push(rule);
        }
    }

    Ok(applicable)
}
