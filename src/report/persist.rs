//! Artifact persistence.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ArtifactNames, Rendered};

/// An artifact could not be written. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Paths of the artifacts written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub snapshot: PathBuf,
    pub report: PathBuf,
}

/// Writes both artifacts into `dir`, creating it if needed.
///
/// Each file is written to a hidden `.tmp` sibling first and renamed into
/// place, so readers never observe a half-written artifact.
pub fn write_artifacts(
    dir: &Path,
    names: &ArtifactNames,
    rendered: &Rendered,
) -> Result<ArtifactPaths, PersistenceError> {
    fs::create_dir_all(dir).map_err(|source| PersistenceError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = ArtifactPaths {
        snapshot: dir.join(&names.snapshot),
        report: dir.join(&names.report),
    };
    write_atomic(&paths.snapshot, rendered.json.as_bytes())?;
    write_atomic(&paths.report, rendered.text.as_bytes())?;
    Ok(paths)
}

fn write_atomic(target: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let temp_path = target.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, target)
    })();

    if let Err(source) = result {
        // Best effort; the original error is what matters.
        let _ = fs::remove_file(&temp_path);
        return Err(PersistenceError::Write {
            path: target.to_path_buf(),
            source,
        });
    }
    debug!(path = %target.display(), bytes = content.len(), "artifact written");
    Ok(())
}
