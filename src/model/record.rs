//! Reconciled per-category record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::raw::{FetchStatus, RawResult};
use super::value::{FieldValue, Fields};

/// A value that lost reconciliation to a more trusted provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub field_name: String,
    pub rejected_value: FieldValue,
    pub rejected_provider: String,
}

/// Diagnostic trace of one provider invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub priority: u32,
    pub status: FetchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl From<&RawResult> for ProviderAttempt {
    fn from(raw: &RawResult) -> Self {
        Self {
            provider: raw.provider_name.clone(),
            priority: raw.priority,
            status: raw.status,
            error: raw.error.clone(),
            duration_ms: u64::try_from(raw.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Merged facts for one category.
///
/// Every key of `fields` has exactly one entry in `provenance` naming the
/// provider whose value won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub category: Category,
    pub fields: Fields,
    pub provenance: BTreeMap<String, String>,
    pub conflicts: Vec<Conflict>,
    /// No provider for this category returned `Ok`.
    pub degraded: bool,
    pub attempts: Vec<ProviderAttempt>,
}

impl NormalizedRecord {
    /// Record for a category where nothing succeeded.
    pub fn degraded(category: Category, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            category,
            fields: Fields::new(),
            provenance: BTreeMap::new(),
            conflicts: Vec::new(),
            degraded: true,
            attempts,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Provider that supplied `field`, if present.
    pub fn source_of(&self, field: &str) -> Option<&str> {
        self.provenance.get(field).map(String::as_str)
    }

    /// Number of providers that returned `Ok`.
    pub fn succeeded(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.status == FetchStatus::Ok)
            .count()
    }
}
