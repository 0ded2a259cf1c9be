//! Spec-file aggregation for service versions.
//!
//! A service version accumulates one attached artifact per specification
//! kind plus whatever payload schemas its messages carry. This module keeps
//! that set consistent across runs: the current run's artifact replaces any
//! previous file of the same name, every other previously attached file is
//! carried forward untouched, and an artifact whose bytes have not changed
//! is not rewritten.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::source::SpecDocument;
use crate::store::{AttachedFile, CatalogStore, EntityKind, VersionQuery};

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Pick the artifact rendition to persist: the source bytes, or the fully
/// resolved form when the caller asked for normalized output and the
/// document carries one.
pub fn artifact_content(doc: &SpecDocument, persist_normalized: bool) -> String {
    if persist_normalized {
        if let Some(resolved) = &doc.resolved {
            return resolved.clone();
        }
    }
    doc.raw.clone()
}

/// Attach the current run's spec artifact to a service version.
///
/// `prior_version` is the version that was latest before an
/// archive-then-create transition, if one happened this run; its attached
/// files (minus any with the current artifact's name) are carried into the
/// new version so artifacts of other spec kinds survive a version bump.
pub async fn sync_spec_artifact(
    store: &dyn CatalogStore,
    service_id: &str,
    service_version: &str,
    doc: &SpecDocument,
    persist_normalized: bool,
    prior_version: Option<&str>,
) -> Result<()> {
    let file_name = doc.artifact_file_name();
    let content = artifact_content(doc, persist_normalized);

    if let Some(prior) = prior_version {
        let carried = store
            .list_files(EntityKind::Service, service_id, VersionQuery::Exact(prior))
            .await?;
        for file in carried {
            if file.file_name == file_name {
                continue;
            }
            store
                .attach_file(EntityKind::Service, service_id, &file, service_version)
                .await?;
        }
    }

    let existing = store
        .list_files(
            EntityKind::Service,
            service_id,
            VersionQuery::Exact(service_version),
        )
        .await?;
    let unchanged = existing
        .iter()
        .any(|f| f.file_name == file_name && content_hash(&f.content) == content_hash(&content));
    if unchanged {
        return Ok(());
    }

    store
        .attach_file(
            EntityKind::Service,
            service_id,
            &AttachedFile::new(file_name, content),
            service_version,
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentInfo, SpecKind};
    use crate::store::memory::MemoryCatalog;

    fn doc(raw: &str, resolved: Option<&str>) -> SpecDocument {
        SpecDocument {
            info: DocumentInfo {
                title: "Account Service".to_string(),
                version: "1.0.0".to_string(),
                description: None,
                tags: Vec::new(),
            },
            spec_kind: SpecKind::AsyncApi,
            id: None,
            file_name: Some("account.asyncapi.yml".to_string()),
            raw: raw.to_string(),
            resolved: resolved.map(String::from),
            operations: Vec::new(),
            channels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn attaches_raw_artifact_by_default() {
        let store = MemoryCatalog::new();
        let document = doc("raw: true", Some("resolved: true"));

        sync_spec_artifact(&store, "account-service", "1.0.0", &document, false, None)
            .await
            .unwrap();

        let files = store
            .list_files(
                EntityKind::Service,
                "account-service",
                VersionQuery::Exact("1.0.0"),
            )
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "raw: true");
    }

    #[tokio::test]
    async fn persists_resolved_rendition_when_asked() {
        let store = MemoryCatalog::new();
        let document = doc("raw: true", Some("resolved: true"));

        sync_spec_artifact(&store, "account-service", "1.0.0", &document, true, None)
            .await
            .unwrap();

        let files = store
            .list_files(
                EntityKind::Service,
                "account-service",
                VersionQuery::Exact("1.0.0"),
            )
            .await
            .unwrap();
        assert_eq!(files[0].content, "resolved: true");
    }

    #[tokio::test]
    async fn carries_other_artifacts_across_version_bump() {
        let store = MemoryCatalog::new();
        store
            .attach_file(
                EntityKind::Service,
                "account-service",
                &AttachedFile::new("openapi.yml", "openapi: 3.0.0"),
                "0.0.1",
            )
            .await
            .unwrap();
        store
            .attach_file(
                EntityKind::Service,
                "account-service",
                &AttachedFile::new("account.asyncapi.yml", "old"),
                "0.0.1",
            )
            .await
            .unwrap();

        let document = doc("new", None);
        sync_spec_artifact(
            &store,
            "account-service",
            "1.0.0",
            &document,
            false,
            Some("0.0.1"),
        )
        .await
        .unwrap();

        let files = store
            .list_files(
                EntityKind::Service,
                "account-service",
                VersionQuery::Exact("1.0.0"),
            )
            .await
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert!(names.contains(&"openapi.yml"));
        let asyncapi = files
            .iter()
            .find(|f| f.file_name == "account.asyncapi.yml")
            .unwrap();
        assert_eq!(asyncapi.content, "new");
    }
}
