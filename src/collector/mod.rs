//! Multi-source host fact collection.
//!
//! Every category of facts (identity, CPU, memory, ...) can be answered by
//! several interchangeable providers. The collector runs all of them, in
//! parallel and isolated from each other, and the reconciler merges their
//! answers into one record per category.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Collector                           │
//! │   JoinSet + Semaphore, per-provider timeout                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │ os-release   │  │ procfs-*     │  │ lscpu, df,   │  ...  │
//! │  │ (priority 10)│  │              │  │ free, ip     │       │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘       │
//! │         └─────────────────┼─────────────────┘               │
//! │                    RawResultLog (append-only)               │
//! │                           │                                 │
//! │                    ┌──────▼──────┐                          │
//! │                    │  reconcile  │ per category             │
//! │                    └──────┬──────┘                          │
//! └───────────────────────────┼─────────────────────────────────┘
//!                             ▼
//!                          Snapshot
//!
//!   providers observe the host only through HostContext:
//!
//!       ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//!       │ FileSystem   │ │CommandRunner │ │ env, os,     │
//!       │ RealFs/MockFs│ │Real/Mock     │ │ arch         │
//!       └──────────────┘ └──────────────┘ └──────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production
//!
//! ```ignore
//! let registry = Registry::builder()
//!     .register_all(standard_providers(false))
//!     .build()?;
//! let collector = Collector::new(HostContext::local(), CollectorSettings::default());
//! let snapshot = collector.run(&registry, &Category::ALL).await?;
//! ```
//!
//! ## Testing (with MockHost)
//!
//! ```
//! use hwfacts::collector::mock::MockHost;
//! use hwfacts::collector::providers::standard_providers;
//! use hwfacts::collector::{Collector, CollectorSettings, Registry};
//! use hwfacts::model::{Category, RunStatus};
//!
//! let registry = Registry::builder()
//!     .register_all(standard_providers(false))
//!     .build()
//!     .unwrap();
//! let collector = Collector::new(MockHost::typical_linux().context(), CollectorSettings::default());
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let snapshot = runtime.block_on(collector.run(&registry, &Category::ALL)).unwrap();
//! assert_eq!(snapshot.status(), RunStatus::Complete);
//! ```

pub mod cgroup;
#[allow(clippy::module_inception)]
mod collector;
mod host;
pub mod mock;
pub mod procfs;
mod provider;
pub mod providers;
mod reconcile;
mod registry;
pub mod tools;
pub mod traits;

pub use collector::{CategoryProgress, CollectionRun, Collector, CollectorSettings, RawResultLog};
pub use host::HostContext;
pub use provider::{Platform, ProviderError, SourceProvider, TIMEOUT_ERROR, invoke};
pub use reconcile::reconcile;
pub use registry::{ConfigurationError, RegisteredProvider, Registry, RegistryBuilder};
pub use traits::{CommandOutput, CommandRunner, FileSystem, RealCommands, RealFs};
