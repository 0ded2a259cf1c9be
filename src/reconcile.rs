//! Version reconciliation state machine.
//!
//! For each entity id the catalog is in one of three states: absent, latest
//! at some version, or latest plus archived history. [`classify`] decides
//! what the current run does about it:
//!
//! - absent → create fresh (default markdown, empty collections)
//! - same version → update in place (markdown and accumulated collections
//!   preserved, freshly derived fields replaced)
//! - different version → archive the existing latest verbatim, then create
//!   fresh; a version bump is a new contract generation and does not carry
//!   collection contents forward

use crate::models::{ChannelRecord, DomainRecord, MessageRecord, ServiceRecord};

/// Anything with the durable `(id, version)` key.
pub trait VersionedRecord {
    fn id(&self) -> &str;
    fn version(&self) -> &str;
}

macro_rules! versioned_record {
    ($($ty:ty),+) => {
        $(impl VersionedRecord for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn version(&self) -> &str {
                &self.version
            }
        })+
    };
}

versioned_record!(DomainRecord, ServiceRecord, MessageRecord, ChannelRecord);

/// The reconciliation decision for one entity candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<T> {
    /// No record at this id; create a fresh latest.
    Create,
    /// A latest record exists at the same version; merge into it.
    UpdateInPlace(T),
    /// A latest record exists at a different version; archive it, then
    /// create a fresh latest.
    ArchiveThenCreate(T),
}

/// Classify a candidate against the catalog's current latest record.
pub fn classify<T: VersionedRecord>(
    existing: Option<T>,
    incoming_version: &str,
) -> Reconciliation<T> {
    match existing {
        None => Reconciliation::Create,
        Some(record) if record.version() == incoming_version => {
            Reconciliation::UpdateInPlace(record)
        }
        Some(record) => Reconciliation::ArchiveThenCreate(record),
    }
}
