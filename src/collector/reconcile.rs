//! Merging provider results into one record per category.
//!
//! Winner selection depends only on `(priority, provider_name)`, never on the
//! order results arrived in:
//!
//! ```text
//!   procfs-meminfo (10)  total_bytes=16.0G  available_bytes=12.0G
//!   free           (20)  total_bytes=16.0G  available_bytes=11.9G
//!   cgroup-memory  (30)  Failed
//!                     │
//!                     ▼
//!   fields      total_bytes=16.0G  available_bytes=12.0G
//!   provenance  both -> procfs-meminfo
//!   conflicts   available_bytes: 11.9G from free
//! ```

use std::collections::BTreeMap;

use crate::model::{
    Category, Conflict, FieldValue, Fields, NormalizedRecord, ProviderAttempt, RawResult,
};

/// Reconciles all results of one category.
///
/// Results belonging to other categories are ignored. If no result is `Ok`
/// the record is flagged degraded and has no fields.
pub fn reconcile(category: Category, results: &[RawResult]) -> NormalizedRecord {
    let mut ordered: Vec<&RawResult> = results.iter().filter(|r| r.category == category).collect();
    ordered.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.provider_name.cmp(&b.provider_name))
    });

    let attempts: Vec<ProviderAttempt> = ordered.iter().map(|r| ProviderAttempt::from(*r)).collect();

    let successful: Vec<&RawResult> = ordered.iter().copied().filter(|r| r.is_ok()).collect();
    if successful.is_empty() {
        return NormalizedRecord::degraded(category, attempts);
    }

    let mut fields = Fields::new();
    let mut provenance = BTreeMap::new();
    // Per field, losing values in provider order.
    let mut rejected: BTreeMap<String, Vec<(FieldValue, String)>> = BTreeMap::new();

    for result in successful {
        for (name, value) in &result.fields {
            match fields.get(name) {
                None => {
                    fields.insert(name.clone(), value.clone());
                    provenance.insert(name.clone(), result.provider_name.clone());
                }
                Some(winner) if winner == value => {}
                Some(_) => rejected
                    .entry(name.clone())
                    .or_default()
                    .push((value.clone(), result.provider_name.clone())),
            }
        }
    }

    let conflicts = rejected
        .into_iter()
        .flat_map(|(field_name, losers)| {
            losers
                .into_iter()
                .map(move |(rejected_value, rejected_provider)| Conflict {
                    field_name: field_name.clone(),
                    rejected_value,
                    rejected_provider,
                })
        })
        .collect();

    NormalizedRecord {
        category,
        fields,
        provenance,
        conflicts,
        degraded: false,
        attempts,
    }
}
