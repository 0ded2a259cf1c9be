//! Domain reconciliation driver.
//!
//! Runs first for every document when a domain is configured: reconcile the
//! domain record itself, then upsert the current service's membership entry.
//! Membership is unique by service id; a repeat run replaces the matching
//! entry in place so relative order is stable across runs.

use anyhow::Result;

use crate::config::DomainRef;
use crate::merge::upsert_domain_service;
use crate::models::{DomainRecord, EntityRef};
use crate::reconcile::{classify, Reconciliation};
use crate::store::{CatalogStore, VersionQuery};

/// What happened to the domain record this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOutcome {
    pub archived: bool,
}

pub fn default_markdown() -> String {
    "## Architecture diagram\n<NodeGraph />\n".to_string()
}

pub async fn reconcile_domain(
    store: &dyn CatalogStore,
    domain: &DomainRef,
    service: EntityRef,
) -> Result<DomainOutcome> {
    println!(
        "processing domain: {} (v{})",
        domain.name, domain.version
    );

    let existing = store.get_domain(&domain.id, VersionQuery::Latest).await?;
    let mut archived = false;

    let mut record = DomainRecord {
        id: domain.id.clone(),
        version: domain.version.clone(),
        name: domain.name.clone(),
        summary: String::new(),
        markdown: default_markdown(),
        badges: Vec::new(),
        services: Vec::new(),
    };

    match classify(existing, &domain.version) {
        Reconciliation::Create => {
            println!("  - domain (v{}) created", domain.version);
        }
        Reconciliation::UpdateInPlace(prev) => {
            record.summary = prev.summary;
            record.markdown = prev.markdown;
            record.services = prev.services;
        }
        Reconciliation::ArchiveThenCreate(prev) => {
            store.archive_domain(&domain.id).await?;
            archived = true;
            println!("  - versioned previous domain (v{})", prev.version);
        }
    }

    upsert_domain_service(&mut record.services, service);
    store.write_domain(&record).await?;

    Ok(DomainOutcome { archived })
}
