//! Report assembly: turns a [`Snapshot`] into its two artifacts and writes them.
//!
//! - machine-readable: the snapshot serialized one-to-one as JSON
//! - human-readable: a curated text summary ([`text`])
//!
//! Persistence ([`persist`]) and CI step outputs ([`ci`]) only consume
//! already-rendered data.

pub mod ci;
pub mod persist;
pub mod text;

use crate::model::Snapshot;

pub use ci::{CiEnvironment, step_outputs};
pub use persist::{ArtifactPaths, PersistenceError, write_artifacts};
pub use text::render_text;

pub const DEFAULT_SNAPSHOT_FILE: &str = "hardware-snapshot.json";
pub const DEFAULT_REPORT_FILE: &str = "hardware-report.txt";

/// Both renderings of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub json: String,
    pub text: String,
}

/// File names of the artifacts inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub snapshot: String,
    pub report: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            snapshot: DEFAULT_SNAPSHOT_FILE.to_string(),
            report: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

/// Renders the structured and the human-readable artifact.
pub fn render(snapshot: &Snapshot) -> Result<Rendered, PersistenceError> {
    Ok(Rendered {
        json: snapshot.to_json()?,
        text: render_text(snapshot),
    })
}
