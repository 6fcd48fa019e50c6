use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{SchemeConfig, SchemeRecord};
use crate::errors::{CalculationError, Result};
use crate::types::{SchemeId, SchemeRef};

#[derive(Debug, Default)]
struct Schemes {
    by_slug: HashMap<String, Arc<SchemeConfig>>,
    slug_by_id: HashMap<SchemeId, String>,
}

/// read-mostly store of admin-managed schemes
///
/// Lookups hand out an `Arc` snapshot; publishing replaces the whole entry, so a
/// calculation in flight keeps the config it started with.
#[derive(Debug, Default)]
pub struct SchemeRegistry {
    schemes: RwLock<Schemes>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// validate and insert or replace a scheme, keyed by slug
    pub fn publish(&self, scheme: SchemeConfig) -> Result<Arc<SchemeConfig>> {
        if let Err(e) = scheme.validate() {
            tracing::warn!(scheme = %scheme.slug, error = %e, "rejected scheme");
            return Err(e);
        }

        let snapshot = Arc::new(scheme);
        let mut schemes = self.schemes.write();

        if let Some(previous_id) = schemes
            .by_slug
            .get(&snapshot.slug)
            .map(|previous| previous.id)
        {
            schemes.slug_by_id.remove(&previous_id);
        }
        schemes.slug_by_id.insert(snapshot.id, snapshot.slug.clone());
        let replaced = schemes
            .by_slug
            .insert(snapshot.slug.clone(), Arc::clone(&snapshot))
            .is_some();

        tracing::info!(
            scheme = %snapshot.slug,
            kind = snapshot.calculation.name(),
            replaced,
            "published scheme"
        );
        Ok(snapshot)
    }

    /// parse and publish stored rows; stops at the first bad row
    pub fn load_records(&self, records: Vec<SchemeRecord>) -> Result<usize> {
        let mut loaded = 0;
        for record in records {
            let scheme = SchemeConfig::try_from(record).map_err(|e| {
                tracing::warn!(error = %e, "failed to load scheme record");
                e
            })?;
            self.publish(scheme)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// load a json array of stored rows
    pub fn load_json(&self, json: &str) -> Result<usize> {
        let records: Vec<SchemeRecord> = serde_json::from_str(json)?;
        self.load_records(records)
    }

    /// remove a scheme; in-flight snapshots stay valid
    pub fn remove(&self, slug: &str) -> Option<Arc<SchemeConfig>> {
        let mut schemes = self.schemes.write();
        let removed = schemes.by_slug.remove(slug);
        if let Some(scheme) = &removed {
            schemes.slug_by_id.remove(&scheme.id);
        }
        removed
    }

    /// resolve an active scheme by slug or id
    pub fn resolve(&self, reference: &SchemeRef) -> Result<Arc<SchemeConfig>> {
        let schemes = self.schemes.read();

        let slug = match reference {
            SchemeRef::Slug(slug) => Some(slug.as_str()),
            SchemeRef::Id(id) => schemes.slug_by_id.get(id).map(String::as_str),
        };

        let scheme = slug
            .and_then(|s| schemes.by_slug.get(s))
            .ok_or_else(|| CalculationError::UnknownScheme {
                reference: reference.to_string(),
            })?;

        if !scheme.is_active() {
            tracing::warn!(scheme = %scheme.slug, "lookup of inactive scheme");
            return Err(CalculationError::UnknownScheme {
                reference: reference.to_string(),
            });
        }

        Ok(Arc::clone(scheme))
    }

    /// active schemes ordered by slug
    pub fn list_active(&self) -> Vec<Arc<SchemeConfig>> {
        let schemes = self.schemes.read();
        let mut active: Vec<_> = schemes
            .by_slug
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.slug.cmp(&b.slug));
        active
    }

    pub fn len(&self) -> usize {
        self.schemes.read().by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::{RatePeriod, SchemeStatus};
    use std::thread;

    fn pct(p: u32) -> Rate {
        Rate::from_whole_percentage(p)
    }

    #[test]
    fn test_resolve_by_slug_and_id() {
        let registry = SchemeRegistry::new();
        let scheme = registry
            .publish(SchemeConfig::tiered("gold-6m", "Gold", pct(2), 6, pct(3)))
            .unwrap();

        let by_slug = registry.resolve(&SchemeRef::from("gold-6m")).unwrap();
        let by_id = registry.resolve(&SchemeRef::Id(scheme.id)).unwrap();
        assert_eq!(by_slug, by_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_and_inactive_schemes() {
        let registry = SchemeRegistry::new();
        registry
            .publish(
                SchemeConfig::flat("old", "Old", pct(2), RatePeriod::Monthly)
                    .with_status(SchemeStatus::Inactive),
            )
            .unwrap();

        let err = registry.resolve(&SchemeRef::from("missing")).unwrap_err();
        assert_eq!(err, CalculationError::UnknownScheme { reference: "missing".to_string() });

        let err = registry.resolve(&SchemeRef::from("old")).unwrap_err();
        assert!(matches!(err, CalculationError::UnknownScheme { .. }));
        assert!(registry.list_active().is_empty());
    }

    #[test]
    fn test_republish_keeps_old_snapshot() {
        let registry = SchemeRegistry::new();
        let first = registry
            .publish(SchemeConfig::tiered("gold", "Gold", pct(2), 6, pct(3)))
            .unwrap();
        let snapshot = registry.resolve(&SchemeRef::from("gold")).unwrap();

        let second = registry
            .publish(SchemeConfig::tiered("gold", "Gold", pct(2), 9, pct(4)))
            .unwrap();

        assert_eq!(snapshot.configured_validity(), Some(6));
        assert_eq!(
            registry.resolve(&SchemeRef::from("gold")).unwrap().configured_validity(),
            Some(9)
        );
        assert!(registry.resolve(&SchemeRef::Id(first.id)).is_err());
        assert!(registry.resolve(&SchemeRef::Id(second.id)).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_scheme_not_published() {
        let registry = SchemeRegistry::new();
        let err = registry
            .publish(SchemeConfig::flat("neg", "Neg", Rate::from_percentage(rust_decimal::Decimal::NEGATIVE_ONE), RatePeriod::Monthly))
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_json_and_remove() {
        let registry = SchemeRegistry::new();
        let loaded = registry
            .load_json(
                r#"[
                    {"slug": "flat", "name": "Flat", "base_rate": "1.5", "rate_period": "monthly",
                     "calculation_kind": "flat"},
                    {"slug": "gold", "name": "Gold", "base_rate": "2", "rate_period": "monthly",
                     "calculation_kind": "tiered", "config": {"validity_months": 6, "surcharge_rate": "3"}}
                ]"#,
            )
            .unwrap();
        assert_eq!(loaded, 2);

        let slugs: Vec<_> = registry
            .list_active()
            .iter()
            .map(|s| s.slug.clone())
            .collect();
        assert_eq!(slugs, vec!["flat", "gold"]);

        assert!(registry.remove("flat").is_some());
        assert!(registry.remove("flat").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_kind_in_records() {
        let registry = SchemeRegistry::new();
        let err = registry
            .load_json(
                r#"[{"slug": "x", "name": "X", "base_rate": "2", "rate_period": "monthly",
                     "calculation_kind": "balloon"}]"#,
            )
            .unwrap_err();
        assert!(matches!(err, CalculationError::UnknownCalculationKind { .. }));
    }

    #[test]
    fn test_panicking_writer_leaves_registry_usable() {
        let registry = Arc::new(SchemeRegistry::new());
        registry
            .publish(SchemeConfig::tiered("gold", "Gold", pct(2), 6, pct(3)))
            .unwrap();

        let writer = Arc::clone(&registry);
        let outcome = thread::spawn(move || {
            let _guard = writer.schemes.write();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(outcome.is_err());

        let scheme = registry.resolve(&SchemeRef::from("gold")).unwrap();
        assert_eq!(scheme.configured_validity(), Some(6));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = Arc::new(SchemeRegistry::new());
        registry
            .publish(SchemeConfig::tiered("gold", "Gold", pct(2), 6, pct(3)))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    if i == 0 {
                        registry
                            .publish(SchemeConfig::tiered("gold", "Gold", pct(2), 9, pct(4)))
                            .unwrap();
                    }
                    let scheme = registry.resolve(&SchemeRef::from("gold")).unwrap();
                    // whichever snapshot was seen, it is internally consistent
                    match scheme.configured_validity() {
                        Some(6) => assert_eq!(scheme.calculation.surcharge_rate(), Some(pct(3))),
                        Some(9) => assert_eq!(scheme.calculation.surcharge_rate(), Some(pct(4))),
                        other => panic!("unexpected validity {:?}", other),
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
