//! Storage abstraction for the catalog.
//!
//! The [`CatalogStore`] trait defines the read/write/archive/attach
//! operations the reconciliation engine needs, enabling pluggable backends
//! (filesystem, in-memory for tests). Implementations must be `Send + Sync`
//! to work with async runtimes.
//!
//! Archival semantics are the same for every backend: `archive_*` copies the
//! current latest record, unmodified, into an immutable slot keyed by its
//! own version. The copy is non-destructive (the latest record stays until
//! the engine writes its replacement) and idempotent per version, so
//! reprocessing a document never produces a second archive entry.

pub mod fs;
pub mod memory;

pub use fs::FsCatalog;
pub use memory::MemoryCatalog;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChannelRecord, DomainRecord, MessageKind, MessageRecord, ServiceRecord};

/// Every entity family the catalog persists, with its directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Domain,
    Service,
    Event,
    Command,
    Query,
    Channel,
}

impl EntityKind {
    /// Catalog directory the kind's records live under.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Domain => "domains",
            EntityKind::Service => "services",
            EntityKind::Event => "events",
            EntityKind::Command => "commands",
            EntityKind::Query => "queries",
            EntityKind::Channel => "channels",
        }
    }
}

impl From<MessageKind> for EntityKind {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Event => EntityKind::Event,
            MessageKind::Command => EntityKind::Command,
            MessageKind::Query => EntityKind::Query,
        }
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "domain" | "domains" => Ok(EntityKind::Domain),
            "service" | "services" => Ok(EntityKind::Service),
            "event" | "events" => Ok(EntityKind::Event),
            "command" | "commands" => Ok(EntityKind::Command),
            "query" | "queries" => Ok(EntityKind::Query),
            "channel" | "channels" => Ok(EntityKind::Channel),
            other => anyhow::bail!(
                "unknown entity kind '{}' (expected domain, service, event, command, query, or channel)",
                other
            ),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Which record version a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionQuery<'a> {
    Latest,
    Exact(&'a str),
}

/// A file attached to an entity version (spec artifacts, payload schemas).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub file_name: String,
    pub content: String,
}

impl AttachedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Abstract catalog storage backend.
///
/// All operations are async (via `async-trait`); in-memory implementations
/// return immediately-ready futures. The engine assumes single-writer
/// access; no backend provides transactions or retries, and I/O errors
/// surface to the caller unmodified.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | `get_*` | Fetch a record at an exact version or the current latest |
/// | `write_*` | Create or replace the latest record |
/// | `archive_*` | Copy the current latest into the immutable archive |
/// | [`list_files`](CatalogStore::list_files) | List files attached to an entity version |
/// | [`attach_file`](CatalogStore::attach_file) | Attach (or replace) a file on an entity version |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_domain(&self, id: &str, version: VersionQuery<'_>)
        -> Result<Option<DomainRecord>>;
    async fn write_domain(&self, record: &DomainRecord) -> Result<()>;
    async fn archive_domain(&self, id: &str) -> Result<()>;

    async fn get_service(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ServiceRecord>>;
    async fn write_service(&self, record: &ServiceRecord) -> Result<()>;
    async fn archive_service(&self, id: &str) -> Result<()>;

    async fn get_message(
        &self,
        kind: MessageKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<MessageRecord>>;
    async fn write_message(&self, kind: MessageKind, record: &MessageRecord) -> Result<()>;
    async fn archive_message(&self, kind: MessageKind, id: &str) -> Result<()>;

    async fn get_channel(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ChannelRecord>>;
    async fn write_channel(&self, record: &ChannelRecord) -> Result<()>;
    async fn archive_channel(&self, id: &str) -> Result<()>;

    async fn list_files(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Vec<AttachedFile>>;
    async fn attach_file(
        &self,
        kind: EntityKind,
        id: &str,
        file: &AttachedFile,
        version: &str,
    ) -> Result<()>;
}

/// Uniform repository capability over one message kind.
///
/// Bound once per message after identity resolution; everything downstream
/// talks to this instead of re-deciding which store family to call.
pub struct MessageRepository<'a> {
    store: &'a dyn CatalogStore,
    kind: MessageKind,
}

impl<'a> MessageRepository<'a> {
    pub fn new(store: &'a dyn CatalogStore, kind: MessageKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub async fn get_latest(&self, id: &str) -> Result<Option<MessageRecord>> {
        self.store
            .get_message(self.kind, id, VersionQuery::Latest)
            .await
    }

    pub async fn write(&self, record: &MessageRecord) -> Result<()> {
        self.store.write_message(self.kind, record).await
    }

    pub async fn archive(&self, id: &str) -> Result<()> {
        self.store.archive_message(self.kind, id).await
    }

    pub async fn attach_schema(
        &self,
        id: &str,
        file: &AttachedFile,
        version: &str,
    ) -> Result<()> {
        self.store
            .attach_file(EntityKind::from(self.kind), id, file, version)
            .await
    }
}
