//! Data model shared by the collector, reconciler and report assembler.
//!
//! - [`category`]: fixed set of fact domains
//! - [`value`]: field values as reported by providers
//! - [`raw`]: per-invocation results (`RawResult`)
//! - [`record`]: reconciled per-category records with provenance
//! - [`snapshot`]: the persisted artifact of a run
//!
//! ```text
//! Snapshot
//!   ├── RunMetadata (timestamps, host, status)
//!   └── NormalizedRecord[]            <- one per requested category
//!         ├── fields / provenance
//!         ├── conflicts[]
//!         └── attempts[]              <- every RawResult, summarized
//! ```

mod category;
mod raw;
mod record;
mod snapshot;
mod value;

pub use category::{Category, UnknownCategory};
pub use raw::{FetchStatus, RawResult};
pub use record::{Conflict, NormalizedRecord, ProviderAttempt};
pub use snapshot::{RunMetadata, RunStatus, Snapshot};
pub use value::{FieldValue, Fields};
