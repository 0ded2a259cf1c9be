//! # Contract Catalog CLI (`ccat`)
//!
//! Thin front end over the reconciliation engine. All behavior lives in the
//! library; the binary only loads configuration, feeds normalized documents
//! in, and prints records back out.
//!
//! ## Usage
//!
//! ```bash
//! # Reconcile normalized documents into the configured catalog
//! ccat reconcile --config ./ccat.toml docs/account.json docs/orders.json
//!
//! # Inspect a stored record
//! ccat get service account-service
//! ccat get event usersignedup --version 0.0.1
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use contract_catalog::config::load_config;
use contract_catalog::source::{DocumentSource, JsonDocumentSource};
use contract_catalog::store::{CatalogStore, EntityKind, VersionQuery};
use contract_catalog::{engine, FsCatalog, MessageKind};

/// Contract Catalog — reconcile interface definitions into a versioned
/// documentation catalog.
#[derive(Parser)]
#[command(
    name = "ccat",
    about = "Reconcile interface definitions into a versioned documentation catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./ccat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile normalized documents into the catalog.
    ///
    /// Each argument is a JSON file holding one normalized document. A file
    /// that fails to parse is skipped with a diagnostic; the rest of the
    /// batch still runs.
    Reconcile {
        /// Normalized document files (JSON).
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },

    /// Print a stored record as JSON.
    Get {
        /// Entity kind: domain, service, event, command, query, or channel.
        kind: EntityKind,
        /// Entity id.
        id: String,
        /// Specific version; defaults to latest.
        #[arg(long)]
        version: Option<String>,
    },
}

async fn get_record(
    store: &FsCatalog,
    kind: EntityKind,
    id: &str,
    version: VersionQuery<'_>,
) -> Result<Option<String>> {
    let json = match kind {
        EntityKind::Domain => store
            .get_domain(id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        EntityKind::Service => store
            .get_service(id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        EntityKind::Event => store
            .get_message(MessageKind::Event, id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        EntityKind::Command => store
            .get_message(MessageKind::Command, id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        EntityKind::Query => store
            .get_message(MessageKind::Query, id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
        EntityKind::Channel => store
            .get_channel(id, version)
            .await?
            .map(|r| serde_json::to_string_pretty(&r))
            .transpose()?,
    };
    Ok(json)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let store = FsCatalog::new(&config.catalog.dir);

    match cli.command {
        Commands::Reconcile { documents } => {
            let source = JsonDocumentSource::new(documents);
            let docs = source.fetch().await?;
            engine::reconcile(&store, &docs, &config.reconcile).await?;
        }
        Commands::Get { kind, id, version } => {
            let query = match version.as_deref() {
                Some(v) => VersionQuery::Exact(v),
                None => VersionQuery::Latest,
            };
            match get_record(&store, kind, &id, query).await? {
                Some(json) => println!("{}", json),
                None => bail!("{} '{}' not found", kind, id),
            }
        }
    }

    Ok(())
}
