//! GitHub Actions step outputs.
//!
//! Values come only from the reconciled snapshot; nothing is re-queried.
//! Keys whose source field was not collected are omitted.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use super::persist::PersistenceError;
use crate::model::{Category, RunStatus, Snapshot};

const MIB: f64 = 1024.0 * 1024.0;

/// CI system whose step-output file we can append to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiEnvironment {
    output_file: PathBuf,
}

impl CiEnvironment {
    /// Recognises GitHub Actions: `GITHUB_ACTIONS=true` with `GITHUB_OUTPUT` set.
    pub fn detect(env: &HashMap<String, String>) -> Option<Self> {
        if env.get("GITHUB_ACTIONS").map(String::as_str) != Some("true") {
            return None;
        }
        env.get("GITHUB_OUTPUT")
            .filter(|path| !path.is_empty())
            .map(|path| Self {
                output_file: PathBuf::from(path),
            })
    }

    pub fn output_file(&self) -> &PathBuf {
        &self.output_file
    }

    /// Appends `key=value` lines for every available output.
    /// Returns the number of keys written.
    pub fn emit(&self, snapshot: &Snapshot) -> Result<usize, PersistenceError> {
        let outputs = step_outputs(snapshot);
        let mut content = String::new();
        for (key, value) in &outputs {
            content.push_str(key);
            content.push('=');
            content.push_str(&single_line(value));
            content.push('\n');
        }

        let write_err = |source| PersistenceError::Write {
            path: self.output_file.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_file)
            .map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;

        debug!(path = %self.output_file.display(), keys = outputs.len(), "CI outputs written");
        Ok(outputs.len())
    }
}

/// Step outputs derived from the snapshot, in a stable order.
pub fn step_outputs(snapshot: &Snapshot) -> Vec<(&'static str, String)> {
    let mut outputs = vec![
        (
            "collection_complete",
            (snapshot.status() == RunStatus::Complete).to_string(),
        ),
        ("collection_status", snapshot.status().as_str().to_string()),
    ];

    let field = |category: Category, name: &str| {
        snapshot
            .record(category)
            .and_then(|record| record.get(name))
            .cloned()
    };

    if let Some(model) = field(Category::CpuInfo, "model_name") {
        outputs.push(("cpu_model", model.to_string()));
    }
    if let Some(count) = field(Category::CpuInfo, "logical_cpus") {
        outputs.push(("cpu_count", count.to_string()));
    }
    if let Some(total) = field(Category::MemoryInfo, "total_bytes").and_then(|v| v.as_f64()) {
        outputs.push(("memory_total_mb", ((total / MIB).round() as i64).to_string()));
    }
    if let Some(usage) = field(Category::MemoryInfo, "usage_percent").and_then(|v| v.as_f64()) {
        outputs.push(("memory_usage_percent", format!("{usage:.2}")));
    }
    if let Some(hostname) = field(Category::SystemIdentity, "hostname") {
        outputs.push(("hostname", hostname.to_string()));
    }
    outputs
}

/// The output file format is line-oriented.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
