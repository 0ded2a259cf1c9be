//! Filesystem [`CatalogStore`] backend.
//!
//! On-disk layout, one directory per entity:
//!
//! ```text
//! <root>/
//!   services/<id>/record.json            latest record
//!   services/<id>/<file>                 attached files (spec artifacts)
//!   services/<id>/versioned/<version>/   immutable archived snapshots
//!   events/<id>/...                      same shape for every kind
//! ```
//!
//! Records are pretty-printed JSON. Archival copies `record.json` and every
//! attached file into the `versioned/<version>/` snapshot; the snapshot is
//! never rewritten once present. I/O errors surface unmodified; there are
//! no retries and no locking, so callers must guarantee single-writer
//! access.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ChannelRecord, DomainRecord, MessageKind, MessageRecord, ServiceRecord};

use super::{AttachedFile, CatalogStore, EntityKind, VersionQuery};

const RECORD_FILE: &str = "record.json";
const VERSIONED_DIR: &str = "versioned";

/// Filesystem catalog backend rooted at a catalog directory.
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entity_dir(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(id)
    }

    fn version_dir(&self, kind: EntityKind, id: &str, version: &str) -> PathBuf {
        self.entity_dir(kind, id).join(VERSIONED_DIR).join(version)
    }

    fn read_json(path: &Path) -> Result<Option<Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record: {}", path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("malformed record: {}", path.display()))?;
        Ok(Some(value))
    }

    fn latest_version(&self, kind: EntityKind, id: &str) -> Result<Option<String>> {
        let record = Self::read_json(&self.entity_dir(kind, id).join(RECORD_FILE))?;
        Ok(record.and_then(|v| v.get("version").and_then(Value::as_str).map(String::from)))
    }

    fn resolve_record_path(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<PathBuf>> {
        let latest = self.entity_dir(kind, id).join(RECORD_FILE);
        match version {
            VersionQuery::Latest => Ok(Some(latest)),
            VersionQuery::Exact(wanted) => {
                if self.latest_version(kind, id)?.as_deref() == Some(wanted) {
                    return Ok(Some(latest));
                }
                Ok(Some(self.version_dir(kind, id, wanted).join(RECORD_FILE)))
            }
        }
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<T>> {
        let path = match self.resolve_record_path(kind, id, version)? {
            Some(p) => p,
            None => return Ok(None),
        };
        match Self::read_json(&path)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn write_record<T: Serialize>(&self, kind: EntityKind, id: &str, record: &T) -> Result<()> {
        let dir = self.entity_dir(kind, id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create entity dir: {}", dir.display()))?;
        let path = dir.join(RECORD_FILE);
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write record: {}", path.display()))?;
        Ok(())
    }

    /// Copy the latest record and its attached files into the versioned
    /// snapshot. A snapshot that already exists is left untouched.
    fn archive_record(&self, kind: EntityKind, id: &str) -> Result<()> {
        let version = match self.latest_version(kind, id)? {
            Some(v) => v,
            None => return Ok(()),
        };
        let snapshot = self.version_dir(kind, id, &version);
        if snapshot.join(RECORD_FILE).exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&snapshot)
            .with_context(|| format!("failed to create snapshot dir: {}", snapshot.display()))?;

        let dir = self.entity_dir(kind, id);
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            std::fs::copy(&path, snapshot.join(&name)).with_context(|| {
                format!("failed to archive {} for {}/{}", name.to_string_lossy(), kind, id)
            })?;
        }
        Ok(())
    }

    fn files_dir(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<PathBuf>> {
        let latest = self.latest_version(kind, id)?;
        match version {
            VersionQuery::Latest => Ok(latest.map(|_| self.entity_dir(kind, id))),
            VersionQuery::Exact(wanted) => {
                if latest.as_deref() == Some(wanted) {
                    Ok(Some(self.entity_dir(kind, id)))
                } else {
                    Ok(Some(self.version_dir(kind, id, wanted)))
                }
            }
        }
    }
}

#[async_trait]
impl CatalogStore for FsCatalog {
    async fn get_domain(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<DomainRecord>> {
        self.get_record(EntityKind::Domain, id, version)
    }

    async fn write_domain(&self, record: &DomainRecord) -> Result<()> {
        self.write_record(EntityKind::Domain, &record.id, record)
    }

    async fn archive_domain(&self, id: &str) -> Result<()> {
        self.archive_record(EntityKind::Domain, id)
    }

    async fn get_service(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ServiceRecord>> {
        self.get_record(EntityKind::Service, id, version)
    }

    async fn write_service(&self, record: &ServiceRecord) -> Result<()> {
        self.write_record(EntityKind::Service, &record.id, record)
    }

    async fn archive_service(&self, id: &str) -> Result<()> {
        self.archive_record(EntityKind::Service, id)
    }

    async fn get_message(
        &self,
        kind: MessageKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<MessageRecord>> {
        self.get_record(EntityKind::from(kind), id, version)
    }

    async fn write_message(&self, kind: MessageKind, record: &MessageRecord) -> Result<()> {
        self.write_record(EntityKind::from(kind), &record.id, record)
    }

    async fn archive_message(&self, kind: MessageKind, id: &str) -> Result<()> {
        self.archive_record(EntityKind::from(kind), id)
    }

    async fn get_channel(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ChannelRecord>> {
        self.get_record(EntityKind::Channel, id, version)
    }

    async fn write_channel(&self, record: &ChannelRecord) -> Result<()> {
        self.write_record(EntityKind::Channel, &record.id, record)
    }

    async fn archive_channel(&self, id: &str) -> Result<()> {
        self.archive_record(EntityKind::Channel, id)
    }

    async fn list_files(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Vec<AttachedFile>> {
        let dir = match self.files_dir(kind, id, version)? {
            Some(d) if d.exists() => d,
            _ => return Ok(Vec::new()),
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == RECORD_FILE {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read attached file: {}", path.display()))?;
            files.push(AttachedFile::new(name, content));
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    async fn attach_file(
        &self,
        kind: EntityKind,
        id: &str,
        file: &AttachedFile,
        version: &str,
    ) -> Result<()> {
        let latest = self.latest_version(kind, id)?;
        let dir = if latest.as_deref() == Some(version) || latest.is_none() {
            self.entity_dir(kind, id)
        } else {
            self.version_dir(kind, id, version)
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create entity dir: {}", dir.display()))?;
        let path = dir.join(&file.file_name);
        std::fs::write(&path, &file.content)
            .with_context(|| format!("failed to attach file: {}", path.display()))?;
        Ok(())
    }
}
