//! Identity and ownership resolution.
//!
//! Derives the canonical id, version, message kind, and ownership role for
//! every entity candidate found in a document. Ids are stable slugs; version
//! overrides declared on an entity win over the document version; an
//! explicit message-type value outside the three known kinds is a fatal
//! configuration error for the whole run.

use std::fmt;

use anyhow::Result;

use crate::models::{MessageKind, Ownership};
use crate::source::MessageDef;

/// Raised when a message declares a type outside `event`/`command`/`query`.
///
/// This aborts the entire run rather than the current document: an unknown
/// classification means the document contract itself is structurally
/// invalid, and partial reconciliation against it is not safe.
#[derive(Debug)]
pub struct InvalidMessageKind {
    pub message_id: String,
    pub value: String,
}

impl fmt::Display for InvalidMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message '{}' declares unknown type '{}' (expected event, command, or query)",
            self.message_id, self.value
        )
    }
}

impl std::error::Error for InvalidMessageKind {}

/// Lower-cased slug of an entity name: alphanumerics kept, every other run
/// of characters collapsed to a single `-`.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Entity-level version override wins over the document version.
pub fn resolve_version(document_version: &str, entity_override: Option<&str>) -> String {
    match entity_override {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => document_version.to_string(),
    }
}

/// Resolve the message-type extension into a [`MessageKind`].
///
/// Absent means `Event`; any explicit value outside the three kinds is
/// fatal for the run.
pub fn resolve_message_kind(message_id: &str, raw: Option<&str>) -> Result<MessageKind> {
    match raw {
        None => Ok(MessageKind::Event),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "event" => Ok(MessageKind::Event),
            "command" => Ok(MessageKind::Command),
            "query" => Ok(MessageKind::Query),
            _ => Err(InvalidMessageKind {
                message_id: message_id.to_string(),
                value: value.to_string(),
            }
            .into()),
        },
    }
}

/// Resolve the ownership-role extension. Defaults to `Provider` when the
/// extension is absent or carries any value other than a consumer role.
pub fn resolve_ownership(raw: Option<&str>) -> Ownership {
    match raw.map(|r| r.to_ascii_lowercase()) {
        Some(role) if role == "consumer" || role == "client" => Ownership::Consumer,
        _ => Ownership::Provider,
    }
}

/// Canonical message id: the declared id, lower-cased.
pub fn message_id(def: &MessageDef) -> String {
    def.id.to_lowercase()
}

/// Display name prefers the message title, falling back to its id.
pub fn message_name(def: &MessageDef) -> String {
    match &def.title {
        Some(title) if !title.trim().is_empty() => title.clone(),
        _ => def.id.clone(),
    }
}

/// Summary falls back to the description only when it is short enough to
/// read as one (under 150 characters).
pub fn summarize(summary: Option<&str>, description: Option<&str>) -> String {
    if let Some(s) = summary {
        if !s.trim().is_empty() {
            return s.to_string();
        }
    }
    match description {
        Some(d) if !d.is_empty() && d.len() < 150 => d.to_string(),
        _ => String::new(),
    }
}
