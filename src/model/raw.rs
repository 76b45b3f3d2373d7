//! Output of a single provider invocation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::value::Fields;

/// Outcome of one provider invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    /// Ran but errored (I/O, parse, non-zero exit, timeout, empty result).
    Failed,
    /// Cannot run on this host (platform mismatch, missing executable).
    Unavailable,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Failed => "failed",
            FetchStatus::Unavailable => "unavailable",
        }
    }
}

/// Result of invoking one provider once.
///
/// Created once per run and never mutated afterwards. Construct through
/// [`RawResult::ok`], [`RawResult::failed`] or [`RawResult::unavailable`] so
/// that an `Ok` result always carries at least one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub provider_name: String,
    pub category: Category,
    pub priority: u32,
    pub status: FetchStatus,
    pub fields: Fields,
    pub error: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub duration: Duration,
}

impl RawResult {
    /// Successful result. Empty success is downgraded to `Failed`.
    pub fn ok(
        provider_name: impl Into<String>,
        category: Category,
        priority: u32,
        fields: Fields,
    ) -> Self {
        if fields.is_empty() {
            return Self::failed(provider_name, category, priority, "provider returned no fields");
        }
        Self {
            provider_name: provider_name.into(),
            category,
            priority,
            status: FetchStatus::Ok,
            fields,
            error: None,
            collected_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn failed(
        provider_name: impl Into<String>,
        category: Category,
        priority: u32,
        error: impl Into<String>,
    ) -> Self {
        Self::without_fields(provider_name, category, priority, FetchStatus::Failed, error)
    }

    pub fn unavailable(
        provider_name: impl Into<String>,
        category: Category,
        priority: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self::without_fields(
            provider_name,
            category,
            priority,
            FetchStatus::Unavailable,
            reason,
        )
    }

    fn without_fields(
        provider_name: impl Into<String>,
        category: Category,
        priority: u32,
        status: FetchStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            category,
            priority,
            status,
            fields: Fields::new(),
            error: Some(error.into()),
            collected_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    /// Records how long the invocation took.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}
