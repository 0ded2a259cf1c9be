//! Catalog record types.
//!
//! These are the versioned documentation entities the engine reads from and
//! writes to the catalog store: domains, services, messages, and channels.
//! Field names serialize in camelCase so the persisted catalog matches the
//! vocabulary consumers of the catalog already expect (`schemaPath`,
//! `asyncapiPath`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A display badge rendered next to an entity.
///
/// Badges are always rebuilt from the source document on every
/// reconciliation run; they are never merged or carried forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub content: String,
    pub text_color: String,
    pub background_color: String,
}

impl Badge {
    /// Build the default badge for a document or message tag.
    pub fn from_tag(tag: &str) -> Self {
        Self {
            content: tag.to_string(),
            text_color: "blue".to_string(),
            background_color: "blue".to_string(),
        }
    }
}

/// A `{id, version}` reference to another catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub version: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// The three message classifications the catalog understands.
///
/// Dispatch over message kinds is a total match on this enum; there is no
/// string-keyed lookup anywhere downstream of identity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Event,
    Command,
    Query,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Event => "event",
            MessageKind::Command => "command",
            MessageKind::Query => "query",
        }
    }
}

/// Whether the service authors a message contract or merely references it.
///
/// `Consumer` messages are never written to the catalog by this service's
/// reconciliation run; they only contribute to its sends/receives lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Provider,
    Consumer,
}

/// A domain groups services. Membership is unique by service id, in
/// first-seen order; later runs update the matching entry in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub services: Vec<EntityRef>,
}

/// A service and the message contracts it sends and receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub sends: Vec<EntityRef>,
    #[serde(default)]
    pub receives: Vec<EntityRef>,
    /// One slot per specification-language kind (`asyncapiPath`,
    /// `openapiPath`). Only the slot for the current run's kind is ever
    /// replaced; the rest pass through verbatim.
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    /// File name of the primary spec artifact attached in the current run.
    #[serde(default)]
    pub schema_path: String,
}

/// A message contract (event, command, or query).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
    /// Present iff the message declares a payload schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
    /// Back-references to channels that declare or link this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<EntityRef>>,
}

/// A parameter declared on a channel address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelParameter {
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A channel messages travel on. Channels carry no summary or badges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ChannelParameter>,
}
