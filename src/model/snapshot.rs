//! Snapshot of a full collection run.
//!
//! On disk the records are keyed by category name:
//!
//! ```text
//! {
//!   "metadata": { "started_at": ..., "status": "partial", ... },
//!   "categories": {
//!     "system_identity": { "fields": {...}, "provenance": {...}, ... },
//!     "cpu_info": { ... }
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::record::NormalizedRecord;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every category has at least one successful provider.
    Complete,
    /// Some, but not all, categories are degraded.
    Partial,
    /// Every category is degraded.
    Failed,
}

impl RunStatus {
    /// Derives the status from per-category degradation flags.
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let degraded = records.iter().filter(|r| r.degraded).count();
        if degraded == 0 {
            RunStatus::Complete
        } else if degraded == records.len() {
            RunStatus::Failed
        } else {
            RunStatus::Partial
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub tool_version: String,
    /// Hostname from the reconciled system identity, when collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub status: RunStatus,
}

/// Terminal artifact of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: RunMetadata,
    #[serde(rename = "categories", with = "records_by_category")]
    pub records: Vec<NormalizedRecord>,
}

impl Snapshot {
    pub fn record(&self, category: Category) -> Option<&NormalizedRecord> {
        self.records.iter().find(|r| r.category == category)
    }

    pub fn status(&self) -> RunStatus {
        self.metadata.status
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Serializes the record list as a map keyed by category name, preserving
/// list order in both directions.
mod records_by_category {
    use std::fmt;

    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::{Category, NormalizedRecord};

    pub fn serialize<S>(records: &[NormalizedRecord], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(records.len()))?;
        for record in records {
            map.serialize_entry(&record.category, record)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NormalizedRecord>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = Vec<NormalizedRecord>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category name to record")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut records = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, record)) =
                    access.next_entry::<Category, NormalizedRecord>()?
                {
                    if record.category != key {
                        return Err(de::Error::custom(format!(
                            "record under '{}' is for category '{}'",
                            key, record.category
                        )));
                    }
                    records.push(record);
                }
                Ok(records)
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conflict, FetchStatus, FieldValue, Fields, ProviderAttempt};
    use std::collections::BTreeMap;

    fn record(category: Category, degraded: bool) -> NormalizedRecord {
        if degraded {
            return NormalizedRecord::degraded(
                category,
                vec![ProviderAttempt {
                    provider: "broken".into(),
                    priority: 10,
                    status: FetchStatus::Failed,
                    error: Some("timeout".into()),
                    duration_ms: 5000,
                }],
            );
        }
        let mut fields = Fields::new();
        fields.insert("total_bytes".into(), FieldValue::Int(17_179_869_184));
        fields.insert("usage_percent".into(), FieldValue::Float(26.75));
        fields.insert("label".into(), FieldValue::Text("16384 MB".into()));
        fields.insert(
            "devices".into(),
            FieldValue::List(vec!["sda".into(), "nvme0n1".into()]),
        );
        let provenance: BTreeMap<String, String> = fields
            .keys()
            .map(|k| (k.clone(), "procfs-meminfo".to_string()))
            .collect();
        NormalizedRecord {
            category,
            fields,
            provenance,
            conflicts: vec![Conflict {
                field_name: "total_bytes".into(),
                rejected_value: FieldValue::Int(17_179_000_000),
                rejected_provider: "free".into(),
            }],
            degraded: false,
            attempts: vec![ProviderAttempt {
                provider: "procfs-meminfo".into(),
                priority: 10,
                status: FetchStatus::Ok,
                error: None,
                duration_ms: 1,
            }],
        }
    }

    fn snapshot(records: Vec<NormalizedRecord>) -> Snapshot {
        let started_at = DateTime::parse_from_rfc3339("2026-10-17T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Snapshot {
            metadata: RunMetadata {
                started_at,
                finished_at: started_at,
                duration_ms: 120,
                tool_version: "0.1.0".into(),
                host: Some("runner-1".into()),
                status: RunStatus::from_records(&records),
            },
            records,
        }
    }

    #[test]
    fn test_status_rules() {
        let all_ok = [
            record(Category::CpuInfo, false),
            record(Category::MemoryInfo, false),
        ];
        assert_eq!(RunStatus::from_records(&all_ok), RunStatus::Complete);

        let some = [
            record(Category::CpuInfo, false),
            record(Category::MemoryInfo, true),
        ];
        assert_eq!(RunStatus::from_records(&some), RunStatus::Partial);

        let none = [
            record(Category::CpuInfo, true),
            record(Category::MemoryInfo, true),
        ];
        assert_eq!(RunStatus::from_records(&none), RunStatus::Failed);
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        // Non-canonical order on purpose.
        let original = snapshot(vec![
            record(Category::NetworkInfo, false),
            record(Category::CpuInfo, true),
            record(Category::MemoryInfo, false),
        ]);

        let json = original.to_json().unwrap();
        let parsed = Snapshot::from_json(&json).unwrap();

        assert_eq!(parsed, original);
        assert_eq!(parsed.status(), RunStatus::Partial);
    }

    #[test]
    fn test_categories_keyed_by_name() {
        let snap = snapshot(vec![record(Category::MemoryInfo, false)]);
        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();

        let memory = &value["categories"]["memory_info"];
        assert_eq!(memory["fields"]["label"], "16384 MB");
        assert_eq!(memory["provenance"]["label"], "procfs-meminfo");
        assert_eq!(memory["conflicts"][0]["rejected_provider"], "free");
        assert_eq!(value["metadata"]["status"], "complete");
    }

    #[test]
    fn test_mismatched_key_is_rejected() {
        let snap = snapshot(vec![record(Category::MemoryInfo, false)]);
        let json = snap
            .to_json()
            .unwrap()
            .replacen("\"memory_info\": {", "\"cpu_info\": {", 1);
        assert!(Snapshot::from_json(&json).is_err());
    }
}
