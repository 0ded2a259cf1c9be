//! Channel reconciliation driver.
//!
//! Channels are reconciled only when `parse_channels` is on. A channel
//! carries address/protocol/parameter details but no summary or badges.
//! This module also resolves which channels link a given message — either
//! because the channel declares the message or because the message is
//! documented directly on the channel — producing the back-reference list
//! stored on the message record.

use anyhow::Result;

use crate::identity::resolve_version;
use crate::models::{ChannelRecord, EntityRef};
use crate::reconcile::{classify, Reconciliation};
use crate::source::{ChannelDef, MessageDef, SpecDocument};
use crate::store::{CatalogStore, VersionQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub reference: EntityRef,
    pub archived: bool,
}

pub fn default_markdown(def: &ChannelDef) -> String {
    let mut markdown = String::new();
    if let Some(description) = &def.description {
        if !description.trim().is_empty() {
            markdown.push_str(&format!("## Overview\n{}\n\n", description));
        }
    }
    markdown.push_str("<ChannelInformation />\n");
    markdown
}

pub async fn reconcile_channel(
    store: &dyn CatalogStore,
    def: &ChannelDef,
    doc: &SpecDocument,
) -> Result<ChannelOutcome> {
    let id = def.id.to_lowercase();
    let version = resolve_version(&doc.info.version, def.version.as_deref());
    println!("processing channel: {} (v{})", id, version);

    let existing = store.get_channel(&id, VersionQuery::Latest).await?;
    let mut archived = false;

    let mut record = ChannelRecord {
        id: id.clone(),
        version: version.clone(),
        name: def.id.clone(),
        markdown: default_markdown(def),
        address: def.address.clone(),
        protocols: def.protocols.clone(),
        parameters: def.parameters.clone(),
    };

    match classify(existing, &version) {
        Reconciliation::Create => {
            println!("  - channel (v{}) created", version);
        }
        Reconciliation::UpdateInPlace(prev) => {
            record.markdown = prev.markdown;
        }
        Reconciliation::ArchiveThenCreate(prev) => {
            store.archive_channel(&id).await?;
            archived = true;
            println!("  - versioned previous channel (v{})", prev.version);
        }
    }

    store.write_channel(&record).await?;

    Ok(ChannelOutcome {
        reference: EntityRef::new(id, version),
        archived,
    })
}

/// Channels linking a message: channels that declare the message id plus
/// channels the message documents itself on. De-duplicated by channel id
/// and sorted, so the result does not depend on declaration order.
pub fn channel_refs_for_message(doc: &SpecDocument, message: &MessageDef) -> Vec<EntityRef> {
    let message_id = message.id.to_lowercase();
    let mut refs: Vec<EntityRef> = Vec::new();

    let mut push_channel = |channel_id: &str, version_override: Option<&str>| {
        let id = channel_id.to_lowercase();
        if refs.iter().any(|r| r.id == id) {
            return;
        }
        let version = resolve_version(&doc.info.version, version_override);
        refs.push(EntityRef::new(id, version));
    };

    for channel in &doc.channels {
        if channel
            .messages
            .iter()
            .any(|m| m.to_lowercase() == message_id)
        {
            push_channel(&channel.id, channel.version.as_deref());
        }
    }

    for channel_id in &message.channels {
        let declared = doc
            .channels
            .iter()
            .find(|c| c.id.to_lowercase() == channel_id.to_lowercase());
        push_channel(channel_id, declared.and_then(|c| c.version.as_deref()));
    }

    refs.sort_by(|a, b| a.id.cmp(&b.id));
    refs
}
