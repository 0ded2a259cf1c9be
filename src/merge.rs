//! Collection merge policy.
//!
//! Union/de-dup rules applied when a record is updated in place. Existing
//! elements keep their relative order; new elements append at the end.
//! Specification maps replace only the current run's slot, and domain
//! membership replaces the matching service entry in place.

use std::collections::BTreeMap;

use crate::models::EntityRef;
use crate::source::SpecKind;

/// Union of two reference lists, de-duplicated by `id`.
///
/// Existing entries win on id collision and keep their positions; incoming
/// entries with unseen ids append in their own order. Repeated runs are
/// idempotent and never lose previously accumulated references.
pub fn merge_refs(existing: &[EntityRef], incoming: &[EntityRef]) -> Vec<EntityRef> {
    let mut merged: Vec<EntityRef> = existing.to_vec();
    for candidate in incoming {
        if !merged.iter().any(|r| r.id == candidate.id) {
            merged.push(candidate.clone());
        }
    }
    merged
}

/// Replace only the slot owned by the current run's spec kind; every other
/// slot passes through unchanged.
pub fn merge_specifications(
    existing: &BTreeMap<String, String>,
    kind: SpecKind,
    file_name: &str,
) -> BTreeMap<String, String> {
    let mut merged = existing.clone();
    merged.insert(kind.slot().to_string(), file_name.to_string());
    merged
}

/// Upsert a service membership entry into a domain's service list.
///
/// An entry matching the service id is replaced in place so the domain
/// keeps exactly one membership per service, updated to the latest version;
/// unseen services append at the end.
pub fn upsert_domain_service(services: &mut Vec<EntityRef>, entry: EntityRef) {
    match services.iter_mut().find(|r| r.id == entry.id) {
        Some(slot) => *slot = entry,
        None => services.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: &str, version: &str) -> EntityRef {
        EntityRef::new(id, version)
    }

    #[test]
    fn merge_refs_unions_without_duplicates() {
        let existing = vec![r("a", "1.0.0")];
        let incoming = vec![r("a", "1.0.0"), r("b", "1.0.0")];
        let merged = merge_refs(&existing, &incoming);
        assert_eq!(merged, vec![r("a", "1.0.0"), r("b", "1.0.0")]);
    }

    #[test]
    fn merge_refs_keeps_existing_order() {
        let existing = vec![r("b", "1.0.0"), r("a", "1.0.0")];
        let incoming = vec![r("c", "1.0.0"), r("a", "2.0.0")];
        let merged = merge_refs(&existing, &incoming);
        assert_eq!(
            merged,
            vec![r("b", "1.0.0"), r("a", "1.0.0"), r("c", "1.0.0")]
        );
    }

    #[test]
    fn merge_refs_is_idempotent() {
        let existing = vec![r("a", "1.0.0"), r("b", "1.0.0")];
        let once = merge_refs(&existing, &existing);
        assert_eq!(once, existing);
    }

    #[test]
    fn specifications_replace_only_own_slot() {
        let mut existing = BTreeMap::new();
        existing.insert("openapiPath".to_string(), "x.yml".to_string());

        let merged = merge_specifications(&existing, SpecKind::AsyncApi, "y.yml");
        assert_eq!(merged.get("openapiPath").unwrap(), "x.yml");
        assert_eq!(merged.get("asyncapiPath").unwrap(), "y.yml");

        let again = merge_specifications(&merged, SpecKind::AsyncApi, "z.yml");
        assert_eq!(again.get("openapiPath").unwrap(), "x.yml");
        assert_eq!(again.get("asyncapiPath").unwrap(), "z.yml");
    }

    #[test]
    fn domain_membership_replaces_in_place() {
        let mut services = vec![r("accounts", "0.0.1"), r("orders", "1.0.0")];
        upsert_domain_service(&mut services, r("accounts", "1.0.0"));
        assert_eq!(services, vec![r("accounts", "1.0.0"), r("orders", "1.0.0")]);

        upsert_domain_service(&mut services, r("payments", "1.0.0"));
        assert_eq!(services.len(), 3);
        assert_eq!(services[2], r("payments", "1.0.0"));
    }
}
