//! Normalized interface-description documents handed to the engine.
//!
//! Parsing AsyncAPI/OpenAPI is somebody else's job: a [`DocumentSource`]
//! produces already-normalized [`SpecDocument`]s with the operations,
//! messages, and channels the reconciliation pipeline cares about. The
//! built-in [`JsonDocumentSource`] reads that normalized shape from JSON
//! files on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ChannelParameter;

/// The specification languages the catalog tracks, one slot each in a
/// service's `specifications` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    AsyncApi,
    OpenApi,
}

impl SpecKind {
    /// The specification slot this kind owns in a service record.
    pub fn slot(&self) -> &'static str {
        match self {
            SpecKind::AsyncApi => "asyncapiPath",
            SpecKind::OpenApi => "openapiPath",
        }
    }

    /// Fallback artifact file name when the document carries none.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SpecKind::AsyncApi => "asyncapi.yml",
            SpecKind::OpenApi => "openapi.yml",
        }
    }
}

/// Which side of an operation the service is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Send,
    Receive,
}

/// Document-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A message payload schema carried inline with the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaArtifact {
    pub file_name: String,
    pub content: String,
}

/// A message as declared in the source document, extension values included.
///
/// `kind`, `version`, and `role` hold the raw extension values; the identity
/// resolver turns them into typed [`MessageKind`](crate::models::MessageKind)
/// / version / [`Ownership`](crate::models::Ownership) decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Message-type extension value (`event` / `command` / `query`).
    #[serde(default)]
    pub kind: Option<String>,
    /// Entity-level version override extension.
    #[serde(default)]
    pub version: Option<String>,
    /// Ownership role extension value.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub schema: Option<SchemaArtifact>,
    /// Channels the message is documented on directly.
    #[serde(default)]
    pub channels: Vec<String>,
}

/// One operation binding: a direction plus the messages that travel on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationBinding {
    pub direction: Direction,
    pub messages: Vec<MessageDef>,
}

/// A channel as declared in the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDef {
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ChannelParameter>,
    /// Ids of messages this channel declares.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Channel-level version override extension.
    #[serde(default)]
    pub version: Option<String>,
}

/// A fully normalized input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    pub info: DocumentInfo,
    pub spec_kind: SpecKind,
    /// Explicit service id override; when absent the id is derived from the
    /// document title.
    #[serde(default)]
    pub id: Option<String>,
    /// File name the spec artifact is attached under.
    #[serde(default)]
    pub file_name: Option<String>,
    /// The source artifact, byte for byte.
    pub raw: String,
    /// Fully dereferenced rendition of the artifact, when the producer has
    /// one. Persisted instead of `raw` when the engine is asked to store
    /// the normalized spec.
    #[serde(default)]
    pub resolved: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationBinding>,
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
}

impl SpecDocument {
    /// Artifact file name, falling back to the kind's default.
    pub fn artifact_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| self.spec_kind.default_file_name().to_string())
    }
}

/// Produces normalized documents for the engine.
///
/// Implementations may read files, call services, or synthesize documents;
/// the engine only sees the normalized shape.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Source label used in diagnostics.
    fn name(&self) -> &str;

    /// Fetch all documents this source currently provides.
    async fn fetch(&self) -> Result<Vec<SpecDocument>>;
}

/// Reads normalized [`SpecDocument`]s from JSON files.
///
/// A file that fails to parse is skipped with a diagnostic on stderr; one
/// malformed input never blocks the documents behind it.
pub struct JsonDocumentSource {
    paths: Vec<PathBuf>,
}

impl JsonDocumentSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DocumentSource for JsonDocumentSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(&self) -> Result<Vec<SpecDocument>> {
        let mut documents = Vec::new();
        for path in &self.paths {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read document: {}", path.display()))?;
            match serde_json::from_str::<SpecDocument>(&contents) {
                Ok(doc) => documents.push(doc),
                Err(err) => {
                    eprintln!("skipping {}: {}", path.display(), err);
                }
            }
        }
        Ok(documents)
    }
}
