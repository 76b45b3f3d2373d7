//! Top-level error of a run and its process exit status.

use crate::collector::ConfigurationError;
use crate::report::PersistenceError;

/// Exit status for `Complete` and `Partial` runs.
pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 1;
/// Every category failed. Artifacts are still written.
pub const EXIT_ALL_FAILED: u8 = 2;
pub const EXIT_PERSISTENCE: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Configuration(_) | Error::Runtime(_) => EXIT_CONFIG,
            Error::Persistence(_) => EXIT_PERSISTENCE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
