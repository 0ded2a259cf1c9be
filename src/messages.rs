//! Message reconciliation driver.
//!
//! Runs once per message discovered in a document's operations. Ownership
//! decides how far it goes: `Provider` messages are fully reconciled
//! (record, payload schema, channel back-references); `Consumer` messages
//! are referenced, not documented — the driver skips the store entirely but
//! still hands back the `{id, version}` pair so the owning service's
//! sends/receives lists pick it up.

use anyhow::Result;

use crate::config::ReconcileOptions;
use crate::identity::{
    message_id, message_name, resolve_message_kind, resolve_ownership, resolve_version, summarize,
};
use crate::merge::merge_refs;
use crate::models::{Badge, EntityRef, MessageRecord, Ownership};
use crate::reconcile::{classify, Reconciliation};
use crate::source::{MessageDef, SpecDocument};
use crate::store::{AttachedFile, CatalogStore, MessageRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub reference: EntityRef,
    /// False for consumer messages, which are never written.
    pub written: bool,
    pub archived: bool,
}

pub fn default_markdown(def: &MessageDef) -> String {
    let mut markdown = String::from("## Architecture\n<NodeGraph />\n");
    if let Some(schema) = &def.schema {
        markdown.push_str(&format!(
            "\n## Schema\n<SchemaViewer file=\"{}\" title=\"Message Schema\" maxHeight=\"500\" />\n",
            schema.file_name
        ));
    }
    markdown
}

pub async fn reconcile_message(
    store: &dyn CatalogStore,
    def: &MessageDef,
    doc: &SpecDocument,
    options: &ReconcileOptions,
    channel_refs: &[EntityRef],
) -> Result<MessageOutcome> {
    let id = message_id(def);
    let version = resolve_version(&doc.info.version, def.version.as_deref());

    // Kind resolution happens before the ownership check: an invalid type
    // classification is a structural contract violation and must abort the
    // run even when the message would otherwise be skipped.
    let kind = resolve_message_kind(&id, def.kind.as_deref())?;
    let ownership = resolve_ownership(def.role.as_deref());
    let reference = EntityRef::new(id.clone(), version.clone());

    if ownership == Ownership::Consumer {
        println!(
            "processing message: {} (v{}) [consumer, not documented]",
            id, version
        );
        return Ok(MessageOutcome {
            reference,
            written: false,
            archived: false,
        });
    }

    println!("processing message: {} (v{})", id, version);

    let repo = MessageRepository::new(store, kind);
    let existing = repo.get_latest(&id).await?;
    let mut archived = false;

    let schema = if options.parse_schemas {
        def.schema.as_ref()
    } else {
        None
    };

    let mut record = MessageRecord {
        id: id.clone(),
        version: version.clone(),
        name: message_name(def),
        summary: summarize(def.summary.as_deref(), def.description.as_deref()),
        markdown: default_markdown(def),
        badges: def.tags.iter().map(|t| Badge::from_tag(t)).collect(),
        schema_path: schema.map(|s| s.file_name.clone()),
        channels: None,
    };

    let mut prior_channels: Vec<EntityRef> = Vec::new();
    match classify(existing, &version) {
        Reconciliation::Create => {
            println!("  - {} (v{}) created", kind.as_str(), version);
        }
        Reconciliation::UpdateInPlace(prev) => {
            record.markdown = prev.markdown;
            prior_channels = prev.channels.unwrap_or_default();
        }
        Reconciliation::ArchiveThenCreate(prev) => {
            repo.archive(&id).await?;
            archived = true;
            println!(
                "  - versioned previous {} (v{})",
                kind.as_str(),
                prev.version
            );
        }
    }

    // Back-references accumulated by earlier runs survive even when the
    // current run is not parsing channels; channel_refs is empty then.
    let merged = merge_refs(&prior_channels, channel_refs);
    if !merged.is_empty() {
        record.channels = Some(merged);
    }

    repo.write(&record).await?;

    if let Some(schema) = schema {
        repo.attach_schema(
            &id,
            &AttachedFile::new(schema.file_name.clone(), schema.content.clone()),
            &version,
        )
        .await?;
    }

    Ok(MessageOutcome {
        reference,
        written: true,
        archived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;
    use crate::source::{DocumentInfo, SchemaArtifact, SpecKind};
    use crate::store::memory::MemoryCatalog;
    use crate::store::VersionQuery;

    fn doc() -> SpecDocument {
        SpecDocument {
            info: DocumentInfo {
                title: "Account Service".to_string(),
                version: "1.0.0".to_string(),
                description: None,
                tags: Vec::new(),
            },
            spec_kind: SpecKind::AsyncApi,
            id: None,
            file_name: None,
            raw: String::new(),
            resolved: None,
            operations: Vec::new(),
            channels: Vec::new(),
        }
    }

    fn message(id: &str) -> MessageDef {
        MessageDef {
            id: id.to_string(),
            title: Some("UserSignedUp".to_string()),
            summary: Some("User signed up the application".to_string()),
            description: None,
            tags: vec!["New".to_string()],
            kind: None,
            version: None,
            role: None,
            schema: None,
            channels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn provider_message_is_documented() {
        let store = MemoryCatalog::new();
        let outcome = reconcile_message(
            &store,
            &message("UserSignedUp"),
            &doc(),
            &ReconcileOptions::default(),
            &[],
        )
        .await
        .unwrap();

        assert!(outcome.written);
        assert_eq!(outcome.reference, EntityRef::new("usersignedup", "1.0.0"));

        let event = store
            .get_message(MessageKind::Event, "usersignedup", VersionQuery::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.name, "UserSignedUp");
        assert_eq!(event.summary, "User signed up the application");
        assert_eq!(event.badges.len(), 1);
        assert_eq!(event.badges[0].content, "New");
    }

    #[tokio::test]
    async fn consumer_message_is_referenced_not_documented() {
        let store = MemoryCatalog::new();
        let mut def = message("OrderShipped");
        def.role = Some("consumer".to_string());

        let outcome = reconcile_message(&store, &def, &doc(), &ReconcileOptions::default(), &[])
            .await
            .unwrap();

        assert!(!outcome.written);
        assert_eq!(outcome.reference, EntityRef::new("ordershipped", "1.0.0"));
        let stored = store
            .get_message(MessageKind::Event, "ordershipped", VersionQuery::Latest)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn schema_is_attached_and_pointer_set() {
        let store = MemoryCatalog::new();
        let mut def = message("UserSignedUp");
        def.schema = Some(SchemaArtifact {
            file_name: "schema.json".to_string(),
            content: "{}".to_string(),
        });

        reconcile_message(&store, &def, &doc(), &ReconcileOptions::default(), &[])
            .await
            .unwrap();

        let event = store
            .get_message(MessageKind::Event, "usersignedup", VersionQuery::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.schema_path.as_deref(), Some("schema.json"));

        let files = store
            .list_files(
                crate::store::EntityKind::Event,
                "usersignedup",
                VersionQuery::Exact("1.0.0"),
            )
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "schema.json");
    }

    #[tokio::test]
    async fn parse_schemas_off_skips_schema() {
        let store = MemoryCatalog::new();
        let mut def = message("UserSignedUp");
        def.schema = Some(SchemaArtifact {
            file_name: "schema.json".to_string(),
            content: "{}".to_string(),
        });
        let options = ReconcileOptions {
            parse_schemas: false,
            ..Default::default()
        };

        reconcile_message(&store, &def, &doc(), &options, &[])
            .await
            .unwrap();

        let event = store
            .get_message(MessageKind::Event, "usersignedup", VersionQuery::Latest)
            .await
            .unwrap()
            .unwrap();
        assert!(event.schema_path.is_none());
    }

    #[tokio::test]
    async fn command_kind_routes_to_command_family() {
        let store = MemoryCatalog::new();
        let mut def = message("SignUpUser");
        def.kind = Some("command".to_string());

        reconcile_message(&store, &def, &doc(), &ReconcileOptions::default(), &[])
            .await
            .unwrap();

        let command = store
            .get_message(MessageKind::Command, "signupuser", VersionQuery::Latest)
            .await
            .unwrap();
        assert!(command.is_some());
        let event = store
            .get_message(MessageKind::Event, "signupuser", VersionQuery::Latest)
            .await
            .unwrap();
        assert!(event.is_none());
    }
}
