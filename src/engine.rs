//! Reconciliation run orchestration.
//!
//! One call reconciles a batch of normalized documents against the catalog,
//! strictly in order: per document the domain driver runs first (when a
//! domain is configured), then channels and messages accumulate membership
//! lists, then the service driver consumes them and the spec-file
//! aggregator attaches the artifact.
//!
//! Failure tiers:
//! 1. malformed options fail before any document is touched;
//! 2. an unrecognized message type aborts the whole run;
//! 3. anything else wrong with a single document skips that document with
//!    a diagnostic and the run continues.

use anyhow::{bail, Result};

use crate::channels::{self, channel_refs_for_message};
use crate::config::ReconcileOptions;
use crate::domains;
use crate::identity::InvalidMessageKind;
use crate::messages;
use crate::models::EntityRef;
use crate::services;
use crate::source::{Direction, SpecDocument};
use crate::specfile;
use crate::store::CatalogStore;

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub documents_processed: u64,
    pub documents_skipped: u64,
    pub domains_written: u64,
    pub services_written: u64,
    pub messages_written: u64,
    pub channels_written: u64,
    pub versions_archived: u64,
}

/// Reconcile every document into the catalog.
pub async fn reconcile(
    store: &dyn CatalogStore,
    documents: &[SpecDocument],
    options: &ReconcileOptions,
) -> Result<RunSummary> {
    options.validate()?;

    let mut summary = RunSummary::default();
    for doc in documents {
        println!("processing {} (v{})", doc.info.title, doc.info.version);
        match process_document(store, doc, options, &mut summary).await {
            Ok(()) => summary.documents_processed += 1,
            Err(err) => {
                // An invalid message kind means the document contract itself
                // is broken; nothing after it can be reconciled safely.
                if err.downcast_ref::<InvalidMessageKind>().is_some() {
                    return Err(err);
                }
                eprintln!("skipping document '{}': {:#}", doc.info.title, err);
                summary.documents_skipped += 1;
            }
        }
    }

    println!("reconcile");
    println!("  documents processed: {}", summary.documents_processed);
    println!("  documents skipped: {}", summary.documents_skipped);
    if options.domain.is_some() {
        println!("  domains written: {}", summary.domains_written);
    }
    println!("  services written: {}", summary.services_written);
    println!("  messages written: {}", summary.messages_written);
    if options.parse_channels {
        println!("  channels written: {}", summary.channels_written);
    }
    println!("  versions archived: {}", summary.versions_archived);
    println!("ok");

    Ok(summary)
}

fn validate_document(doc: &SpecDocument) -> Result<()> {
    if doc.info.title.trim().is_empty() {
        bail!("document has no title");
    }
    if doc.info.version.trim().is_empty() {
        bail!("document '{}' has no version", doc.info.title);
    }
    Ok(())
}

async fn process_document(
    store: &dyn CatalogStore,
    doc: &SpecDocument,
    options: &ReconcileOptions,
    summary: &mut RunSummary,
) -> Result<()> {
    validate_document(doc)?;

    let service_ref = EntityRef::new(services::service_id(doc), doc.info.version.clone());

    if let Some(domain) = &options.domain {
        let outcome = domains::reconcile_domain(store, domain, service_ref.clone()).await?;
        summary.domains_written += 1;
        if outcome.archived {
            summary.versions_archived += 1;
        }
    }

    if options.parse_channels {
        for channel in &doc.channels {
            let outcome = channels::reconcile_channel(store, channel, doc).await?;
            summary.channels_written += 1;
            if outcome.archived {
                summary.versions_archived += 1;
            }
        }
    }

    let mut sends: Vec<EntityRef> = Vec::new();
    let mut receives: Vec<EntityRef> = Vec::new();
    for binding in &doc.operations {
        for def in &binding.messages {
            let channel_refs = if options.parse_channels {
                channel_refs_for_message(doc, def)
            } else {
                Vec::new()
            };
            let outcome =
                messages::reconcile_message(store, def, doc, options, &channel_refs).await?;
            if outcome.written {
                summary.messages_written += 1;
            }
            if outcome.archived {
                summary.versions_archived += 1;
            }

            let list = match binding.direction {
                Direction::Send => &mut sends,
                Direction::Receive => &mut receives,
            };
            if !list.iter().any(|r| r.id == outcome.reference.id) {
                list.push(outcome.reference);
            }
        }
    }

    let outcome = services::reconcile_service(store, doc, &sends, &receives).await?;
    summary.services_written += 1;
    if outcome.archived {
        summary.versions_archived += 1;
    }

    specfile::sync_spec_artifact(
        store,
        &outcome.reference.id,
        &outcome.reference.version,
        doc,
        options.persist_normalized_spec,
        outcome.prior_version.as_deref(),
    )
    .await?;

    Ok(())
}
