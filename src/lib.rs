//! # Contract Catalog
//!
//! A reconciliation engine that turns normalized interface-description
//! documents (services, the messages they send and receive, and the
//! channels those messages travel on) into a persistent, versioned
//! documentation catalog.
//!
//! For every entity derived from an input document the engine decides
//! whether to create it, update it in place, or archive the previous
//! version and create a new one — preserving human-authored markdown and
//! merging collection-valued fields instead of overwriting them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────┐   ┌─────────────┐
//! │ Document     │──▶│ Reconciliation engine      │──▶│ Catalog     │
//! │ sources      │   │ domain→channels→messages   │   │ store       │
//! │ (normalized) │   │ →service + spec artifacts  │   │ (fs/memory) │
//! └──────────────┘   └───────────────────────────┘   └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Catalog record types (domain, service, message, channel) |
//! | [`source`] | Normalized document model and [`source::DocumentSource`] |
//! | [`identity`] | Id/version/kind/ownership resolution |
//! | [`merge`] | Collection merge policy (union, slot, membership rules) |
//! | [`reconcile`] | Create / update-in-place / archive-then-create decisions |
//! | [`store`] | [`store::CatalogStore`] trait plus fs and memory backends |
//! | [`domains`], [`services`], [`messages`], [`channels`] | Per-kind drivers |
//! | [`specfile`] | Spec artifact aggregation per service version |
//! | [`engine`] | [`engine::reconcile`] entry point, options, error tiers |
//! | [`config`] | TOML configuration and validation |

pub mod channels;
pub mod config;
pub mod domains;
pub mod engine;
pub mod identity;
pub mod merge;
pub mod messages;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod source;
pub mod specfile;
pub mod store;

pub use config::{Config, DomainRef, ReconcileOptions};
pub use engine::{reconcile, RunSummary};
pub use models::{
    Badge, ChannelRecord, DomainRecord, EntityRef, MessageKind, MessageRecord, Ownership,
    ServiceRecord,
};
pub use source::{DocumentSource, JsonDocumentSource, SpecDocument, SpecKind};
pub use store::{fs::FsCatalog, memory::MemoryCatalog, CatalogStore, EntityKind, VersionQuery};
