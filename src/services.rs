//! Service reconciliation driver.
//!
//! Runs last for each document, consuming the sends/receives lists the
//! message driver accumulated. On a same-version update the human-authored
//! markdown and previously accumulated sends/receives survive; badges,
//! summary, and the schema pointer are always rebuilt from the document.
//! The specifications map only ever has the current run's slot replaced.

use anyhow::Result;

use crate::identity::{slugify, summarize};
use crate::merge::{merge_refs, merge_specifications};
use crate::models::{Badge, EntityRef, ServiceRecord};
use crate::reconcile::{classify, Reconciliation};
use crate::source::SpecDocument;
use crate::store::{CatalogStore, VersionQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOutcome {
    pub reference: EntityRef,
    pub archived: bool,
    /// Version that was latest before an archive-then-create transition.
    pub prior_version: Option<String>,
}

/// Canonical service id: explicit override when the document carries one,
/// otherwise a slug of the title. Ids are lower-cased either way.
pub fn service_id(doc: &SpecDocument) -> String {
    match &doc.id {
        Some(id) if !id.trim().is_empty() => id.to_lowercase(),
        _ => slugify(&doc.info.title),
    }
}

pub fn default_markdown(doc: &SpecDocument) -> String {
    let mut markdown = String::new();
    if let Some(description) = &doc.info.description {
        if !description.trim().is_empty() {
            markdown.push_str(description);
            markdown.push_str("\n\n");
        }
    }
    markdown.push_str("## Architecture diagram\n<NodeGraph />\n");
    markdown
}

pub async fn reconcile_service(
    store: &dyn CatalogStore,
    doc: &SpecDocument,
    sends: &[EntityRef],
    receives: &[EntityRef],
) -> Result<ServiceOutcome> {
    let id = service_id(doc);
    let version = doc.info.version.clone();
    let file_name = doc.artifact_file_name();
    println!("processing service: {} (v{})", doc.info.title, version);

    let existing = store.get_service(&id, VersionQuery::Latest).await?;
    let mut archived = false;
    let mut prior_version = None;

    let mut record = ServiceRecord {
        id: id.clone(),
        version: version.clone(),
        name: doc.info.title.clone(),
        summary: summarize(None, doc.info.description.as_deref()),
        markdown: default_markdown(doc),
        badges: doc.info.tags.iter().map(|t| Badge::from_tag(t)).collect(),
        sends: sends.to_vec(),
        receives: receives.to_vec(),
        specifications: merge_specifications(&Default::default(), doc.spec_kind, &file_name),
        schema_path: file_name.clone(),
    };

    match classify(existing, &version) {
        Reconciliation::Create => {
            println!("  - service (v{}) created", version);
        }
        Reconciliation::UpdateInPlace(prev) => {
            record.markdown = prev.markdown;
            record.sends = merge_refs(&prev.sends, sends);
            record.receives = merge_refs(&prev.receives, receives);
            record.specifications =
                merge_specifications(&prev.specifications, doc.spec_kind, &file_name);
        }
        Reconciliation::ArchiveThenCreate(prev) => {
            store.archive_service(&id).await?;
            archived = true;
            prior_version = Some(prev.version.clone());
            println!("  - versioned previous service (v{})", prev.version);
        }
    }

    store.write_service(&record).await?;

    Ok(ServiceOutcome {
        reference: EntityRef::new(id, version),
        archived,
        prior_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentInfo, SpecKind};
    use crate::store::memory::MemoryCatalog;

    fn doc(version: &str) -> SpecDocument {
        SpecDocument {
            info: DocumentInfo {
                title: "Account Service".to_string(),
                version: version.to_string(),
                description: Some("This service is in charge of processing user signups".to_string()),
                tags: vec!["Events".to_string(), "Authentication".to_string()],
            },
            spec_kind: SpecKind::AsyncApi,
            id: None,
            file_name: Some("simple.asyncapi.yml".to_string()),
            raw: "asyncapi: 3.0.0".to_string(),
            resolved: None,
            operations: Vec::new(),
            channels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn creates_service_with_derived_fields() {
        let store = MemoryCatalog::new();
        let outcome = reconcile_service(&store, &doc("1.0.0"), &[], &[])
            .await
            .unwrap();

        assert_eq!(
            outcome.reference,
            EntityRef::new("account-service", "1.0.0")
        );

        let service = store
            .get_service("account-service", VersionQuery::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(service.name, "Account Service");
        assert_eq!(
            service.summary,
            "This service is in charge of processing user signups"
        );
        assert_eq!(service.schema_path, "simple.asyncapi.yml");
        assert_eq!(
            service.specifications.get("asyncapiPath").unwrap(),
            "simple.asyncapi.yml"
        );
        assert_eq!(service.badges.len(), 2);
    }

    #[tokio::test]
    async fn explicit_id_override_wins_and_is_lowercased() {
        let store = MemoryCatalog::new();
        let mut document = doc("1.0.0");
        document.id = Some("Custom-Id".to_string());

        let outcome = reconcile_service(&store, &document, &[], &[])
            .await
            .unwrap();
        assert_eq!(outcome.reference.id, "custom-id");
        assert!(store
            .get_service("custom-id", VersionQuery::Latest)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn same_version_update_preserves_markdown_and_merges_sends() {
        let store = MemoryCatalog::new();
        let mut seeded = ServiceRecord {
            id: "account-service".to_string(),
            version: "1.0.0".to_string(),
            name: "Random Name".to_string(),
            summary: String::new(),
            markdown: "do not override".to_string(),
            badges: Vec::new(),
            sends: vec![EntityRef::new("a", "1.0.0")],
            receives: Vec::new(),
            specifications: Default::default(),
            schema_path: String::new(),
        };
        seeded
            .specifications
            .insert("openapiPath".to_string(), "x.yml".to_string());
        store.write_service(&seeded).await.unwrap();

        let sends = vec![
            EntityRef::new("a", "1.0.0"),
            EntityRef::new("b", "1.0.0"),
        ];
        reconcile_service(&store, &doc("1.0.0"), &sends, &[])
            .await
            .unwrap();

        let service = store
            .get_service("account-service", VersionQuery::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(service.markdown, "do not override");
        assert_eq!(service.name, "Account Service");
        assert_eq!(service.sends.len(), 2);
        assert_eq!(service.specifications.get("openapiPath").unwrap(), "x.yml");
        assert_eq!(
            service.specifications.get("asyncapiPath").unwrap(),
            "simple.asyncapi.yml"
        );
    }

    #[tokio::test]
    async fn version_change_archives_and_starts_fresh() {
        let store = MemoryCatalog::new();
        reconcile_service(
            &store,
            &doc("0.0.1"),
            &[EntityRef::new("old-msg", "0.0.1")],
            &[],
        )
        .await
        .unwrap();

        let outcome = reconcile_service(&store, &doc("1.0.0"), &[], &[])
            .await
            .unwrap();
        assert!(outcome.archived);
        assert_eq!(outcome.prior_version.as_deref(), Some("0.0.1"));

        let old = store
            .get_service("account-service", VersionQuery::Exact("0.0.1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.sends, vec![EntityRef::new("old-msg", "0.0.1")]);

        let new = store
            .get_service("account-service", VersionQuery::Exact("1.0.0"))
            .await
            .unwrap()
            .unwrap();
        assert!(new.sends.is_empty());
    }
}
