//! In-memory [`CatalogStore`] implementation for testing.
//!
//! Records are held as `serde_json::Value` behind `std::sync::RwLock`, one
//! slot per `(kind, id)` with a latest pointer plus an archive map keyed by
//! version. Archival inserts a verbatim copy of the latest value, so the
//! backend naturally satisfies the copy-not-move and idempotency contracts.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ChannelRecord, DomainRecord, MessageKind, MessageRecord, ServiceRecord};

use super::{AttachedFile, CatalogStore, EntityKind, VersionQuery};

#[derive(Default)]
struct Slot {
    latest: Option<(String, Value)>,
    archived: HashMap<String, Value>,
}

/// In-memory catalog backend.
#[derive(Default)]
pub struct MemoryCatalog {
    entities: RwLock<HashMap<(EntityKind, String), Slot>>,
    files: RwLock<HashMap<(EntityKind, String, String), Vec<AttachedFile>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_value(&self, kind: EntityKind, id: &str, version: VersionQuery<'_>) -> Option<Value> {
        let entities = self.entities.read().unwrap();
        let slot = entities.get(&(kind, id.to_string()))?;
        match version {
            VersionQuery::Latest => slot.latest.as_ref().map(|(_, v)| v.clone()),
            VersionQuery::Exact(wanted) => match &slot.latest {
                Some((current, value)) if current == wanted => Some(value.clone()),
                _ => slot.archived.get(wanted).cloned(),
            },
        }
    }

    fn write_value(&self, kind: EntityKind, id: &str, version: &str, value: Value) {
        let mut entities = self.entities.write().unwrap();
        let slot = entities.entry((kind, id.to_string())).or_default();
        slot.latest = Some((version.to_string(), value));
    }

    fn archive_value(&self, kind: EntityKind, id: &str) {
        let mut entities = self.entities.write().unwrap();
        if let Some(slot) = entities.get_mut(&(kind, id.to_string())) {
            if let Some((version, value)) = &slot.latest {
                // An existing snapshot is immutable; re-archiving at the
                // same version must not rewrite it.
                if !slot.archived.contains_key(version) {
                    slot.archived.insert(version.clone(), value.clone());
                }
            }
        }
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<T>> {
        match self.get_value(kind, id, version) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn write_record<T: Serialize>(
        &self,
        kind: EntityKind,
        id: &str,
        version: &str,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.write_value(kind, id, version, value);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_domain(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<DomainRecord>> {
        self.get_record(EntityKind::Domain, id, version)
    }

    async fn write_domain(&self, record: &DomainRecord) -> Result<()> {
        self.write_record(EntityKind::Domain, &record.id, &record.version, record)
    }

    async fn archive_domain(&self, id: &str) -> Result<()> {
        self.archive_value(EntityKind::Domain, id);
        Ok(())
    }

    async fn get_service(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ServiceRecord>> {
        self.get_record(EntityKind::Service, id, version)
    }

    async fn write_service(&self, record: &ServiceRecord) -> Result<()> {
        self.write_record(EntityKind::Service, &record.id, &record.version, record)
    }

    async fn archive_service(&self, id: &str) -> Result<()> {
        self.archive_value(EntityKind::Service, id);
        Ok(())
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
        self.write_record(EntityKind::from(kind), &record.id, &record.version, record)
    }

    async fn archive_message(&self, kind: MessageKind, id: &str) -> Result<()> {
        self.archive_value(EntityKind::from(kind), id);
        Ok(())
    }

    async fn get_channel(
        &self,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Option<ChannelRecord>> {
        self.get_record(EntityKind::Channel, id, version)
    }

    async fn write_channel(&self, record: &ChannelRecord) -> Result<()> {
        self.write_record(EntityKind::Channel, &record.id, &record.version, record)
    }

    async fn archive_channel(&self, id: &str) -> Result<()> {
        self.archive_value(EntityKind::Channel, id);
        Ok(())
    }

    async fn list_files(
        &self,
        kind: EntityKind,
        id: &str,
        version: VersionQuery<'_>,
    ) -> Result<Vec<AttachedFile>> {
        let resolved = match version {
            VersionQuery::Exact(v) => v.to_string(),
            VersionQuery::Latest => {
                let entities = self.entities.read().unwrap();
                match entities
                    .get(&(kind, id.to_string()))
                    .and_then(|s| s.latest.as_ref())
                {
                    Some((v, _)) => v.clone(),
                    None => return Ok(Vec::new()),
                }
            }
        };
        let files = self.files.read().unwrap();
        Ok(files
            .get(&(kind, id.to_string(), resolved))
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_file(
        &self,
        kind: EntityKind,
        id: &str,
        file: &AttachedFile,
        version: &str,
    ) -> Result<()> {
        let mut files = self.files.write().unwrap();
        let entry = files
            .entry((kind, id.to_string(), version.to_string()))
            .or_default();
        entry.retain(|f| f.file_name != file.file_name);
        entry.push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityRef;

    fn service(version: &str) -> ServiceRecord {
        ServiceRecord {
            id: "account-service".to_string(),
            version: version.to_string(),
            name: "Account Service".to_string(),
            summary: String::new(),
            markdown: String::new(),
            badges: Vec::new(),
            sends: vec![EntityRef::new("usersignedup", version)],
            receives: Vec::new(),
            specifications: Default::default(),
            schema_path: String::new(),
        }
    }

    #[tokio::test]
    async fn archive_is_a_copy_not_a_move() {
        let store = MemoryCatalog::new();
        store.write_service(&service("0.0.1")).await.unwrap();
        store.archive_service("account-service").await.unwrap();

        let latest = store
            .get_service("account-service", VersionQuery::Latest)
            .await
            .unwrap();
        let archived = store
            .get_service("account-service", VersionQuery::Exact("0.0.1"))
            .await
            .unwrap();
        assert!(latest.is_some());
        assert_eq!(archived.unwrap().version, "0.0.1");
    }

    #[tokio::test]
    async fn archive_twice_keeps_one_entry_per_version() {
        let store = MemoryCatalog::new();
        store.write_service(&service("0.0.1")).await.unwrap();
        store.archive_service("account-service").await.unwrap();
        store.archive_service("account-service").await.unwrap();

        let archived = store
            .get_service("account-service", VersionQuery::Exact("0.0.1"))
            .await
            .unwrap();
        assert_eq!(archived.unwrap().version, "0.0.1");
    }

    #[tokio::test]
    async fn archive_never_rewrites_an_existing_snapshot() {
        let store = MemoryCatalog::new();
        let mut original = service("0.0.1");
        original.markdown = "original".to_string();
        store.write_service(&original).await.unwrap();
        store.archive_service("account-service").await.unwrap();

        // Mutate the latest record at the same version, then archive again.
        let mut edited = service("0.0.1");
        edited.markdown = "edited".to_string();
        store.write_service(&edited).await.unwrap();
        store.archive_service("account-service").await.unwrap();

        // Bump latest so the exact read resolves through the archive.
        store.write_service(&service("1.0.0")).await.unwrap();
        let archived = store
            .get_service("account-service", VersionQuery::Exact("0.0.1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(archived.markdown, "original");
    }

    #[tokio::test]
    async fn attach_file_replaces_same_name() {
        let store = MemoryCatalog::new();
        store
            .attach_file(
                EntityKind::Service,
                "svc",
                &AttachedFile::new("spec.yml", "v1"),
                "1.0.0",
            )
            .await
            .unwrap();
        store
            .attach_file(
                EntityKind::Service,
                "svc",
                &AttachedFile::new("spec.yml", "v2"),
                "1.0.0",
            )
            .await
            .unwrap();

        let files = store
            .list_files(EntityKind::Service, "svc", VersionQuery::Exact("1.0.0"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "v2");
    }
}
