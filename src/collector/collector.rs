//! Fan-out/fan-in driver for a collection run.
//!
//! Every registered provider of every requested category runs exactly once,
//! in its own task, behind a semaphore that caps how many run at the same
//! time. Each task appends its [`RawResult`] to a shared [`RawResultLog`].
//! When the last provider of a category reports, that category is reconciled
//! on its own and the progress callback fires.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::collector::host::HostContext;
use crate::collector::provider::invoke;
use crate::collector::reconcile::reconcile;
use crate::collector::registry::{ConfigurationError, RegisteredProvider, Registry};
use crate::model::{
    Category, FetchStatus, NormalizedRecord, RawResult, RunMetadata, RunStatus, Snapshot,
};

/// Run-wide collection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Timeout for providers without their own.
    pub timeout: Duration,
    /// Maximum number of providers running at once.
    pub max_concurrency: usize,
}

impl CollectorSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            max_concurrency: Self::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Append-only, thread-safe collection of the results of one run.
#[derive(Debug, Default)]
pub struct RawResultLog {
    results: Mutex<Vec<RawResult>>,
}

impl RawResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, result: RawResult) {
        self.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies of the results recorded so far for `category`.
    pub fn for_category(&self, category: Category) -> Vec<RawResult> {
        self.lock()
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    pub fn into_results(self) -> Vec<RawResult> {
        self.results
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RawResult>> {
        // Appends are single pushes; a poisoned lock still holds a valid Vec.
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Progress notification, emitted once per category as it completes.
#[derive(Debug, Clone, Copy)]
pub struct CategoryProgress<'a> {
    pub record: &'a NormalizedRecord,
    /// Categories completed so far, including this one.
    pub completed: usize,
    pub total: usize,
}

type ProgressFn = dyn Fn(CategoryProgress<'_>) + Send + Sync;

/// Result of a run: the snapshot and every raw result behind it.
#[derive(Debug)]
pub struct CollectionRun {
    pub snapshot: Snapshot,
    pub results: Vec<RawResult>,
}

/// Drives providers from a [`Registry`] against one host.
pub struct Collector {
    host: HostContext,
    settings: CollectorSettings,
    progress: Option<Arc<ProgressFn>>,
}

impl Collector {
    pub fn new(host: HostContext, settings: CollectorSettings) -> Self {
        Self {
            host,
            settings,
            progress: None,
        }
    }

    /// Registers a callback invoked as each category finishes.
    pub fn with_progress(
        mut self,
        progress: impl Fn(CategoryProgress<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Collects the requested categories into a snapshot.
    pub async fn run(
        &self,
        registry: &Registry,
        categories: &[Category],
    ) -> Result<Snapshot, ConfigurationError> {
        Ok(self.collect(registry, categories).await?.snapshot)
    }

    /// Like [`Collector::run`], but also returns the raw results.
    ///
    /// Fails only if a requested category is not in the registry; that check
    /// happens before any provider runs.
    pub async fn collect(
        &self,
        registry: &Registry,
        categories: &[Category],
    ) -> Result<CollectionRun, ConfigurationError> {
        let mut requested: Vec<Category> = Vec::with_capacity(categories.len());
        for category in categories {
            if !requested.contains(category) {
                requested.push(*category);
            }
        }
        if requested.is_empty() {
            return Err(ConfigurationError::NoCategories);
        }

        let mut plan: Vec<(Category, &[RegisteredProvider])> = Vec::with_capacity(requested.len());
        for category in &requested {
            plan.push((*category, registry.providers_for(*category)?));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let provider_count: usize = plan.iter().map(|(_, p)| p.len()).sum();
        info!(
            categories = requested.len(),
            providers = provider_count,
            max_concurrency = self.settings.max_concurrency,
            "collection started"
        );

        let log = Arc::new(RawResultLog::new());
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut pending: BTreeMap<Category, usize> = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for (category, providers) in &plan {
            pending.insert(*category, providers.len());
            for entry in providers.iter() {
                tasks.spawn(run_provider(
                    entry.clone(),
                    self.host.clone(),
                    entry.timeout().unwrap_or(self.settings.timeout),
                    Arc::clone(&semaphore),
                    Arc::clone(&log),
                ));
            }
        }

        let mut records: BTreeMap<Category, NormalizedRecord> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let category = match joined {
                Ok(category) => category,
                Err(e) => {
                    warn!(error = %e, "provider task did not complete");
                    continue;
                }
            };
            let Some(remaining) = pending.get_mut(&category) else {
                continue;
            };
            *remaining -= 1;
            if *remaining == 0 {
                let record = self.finish_category(category, &log, records.len() + 1, requested.len());
                records.insert(category, record);
            }
        }

        // Categories whose bookkeeping was cut short still get a record.
        for category in &requested {
            if !records.contains_key(category) {
                let record = self.finish_category(*category, &log, records.len() + 1, requested.len());
                records.insert(*category, record);
            }
        }

        let records: Vec<NormalizedRecord> = requested
            .iter()
            .filter_map(|c| records.remove(c))
            .collect();
        let status = RunStatus::from_records(&records);
        let host = records
            .iter()
            .find(|r| r.category == Category::SystemIdentity)
            .and_then(|r| r.get("hostname"))
            .and_then(|v| v.as_text())
            .map(str::to_string);
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(status = status.as_str(), duration_ms, "collection finished");

        let snapshot = Snapshot {
            metadata: RunMetadata {
                started_at,
                finished_at: Utc::now(),
                duration_ms,
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                host,
                status,
            },
            records,
        };

        let results = Arc::try_unwrap(log)
            .map(RawResultLog::into_results)
            .unwrap_or_else(|shared| {
                requested
                    .iter()
                    .flat_map(|c| shared.for_category(*c))
                    .collect()
            });

        Ok(CollectionRun { snapshot, results })
    }

    fn finish_category(
        &self,
        category: Category,
        log: &RawResultLog,
        completed: usize,
        total: usize,
    ) -> NormalizedRecord {
        let record = reconcile(category, &log.for_category(category));
        if record.degraded {
            warn!(category = %category, "no provider succeeded, category degraded");
        } else {
            debug!(
                category = %category,
                fields = record.fields.len(),
                conflicts = record.conflicts.len(),
                "category reconciled"
            );
        }
        if let Some(progress) = &self.progress {
            progress(CategoryProgress {
                record: &record,
                completed,
                total,
            });
        }
        record
    }
}

/// Runs one provider in an inner task so that a panic is contained and
/// recorded as a failure. Returns the provider's category.
async fn run_provider(
    entry: RegisteredProvider,
    host: HostContext,
    timeout: Duration,
    semaphore: Arc<Semaphore>,
    log: Arc<RawResultLog>,
) -> Category {
    let provider = Arc::clone(entry.provider());
    let category = provider.category();
    let priority = entry.priority();
    let name = provider.name().to_string();

    // The semaphore is never closed, so acquisition only fails if it is.
    let _permit = semaphore.acquire_owned().await.ok();

    let inner_provider = Arc::clone(&provider);
    let joined = tokio::spawn(async move {
        invoke(inner_provider.as_ref(), priority, &host, timeout).await
    })
    .await;

    let result = match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => RawResult::failed(&name, category, priority, "provider panicked"),
        Err(e) => RawResult::failed(&name, category, priority, e.to_string()),
    };

    match result.status {
        FetchStatus::Ok => debug!(
            provider = %name,
            fields = result.fields.len(),
            elapsed_ms = result.duration.as_millis() as u64,
            "provider ok"
        ),
        FetchStatus::Unavailable => debug!(
            provider = %name,
            reason = result.error.as_deref().unwrap_or_default(),
            "provider unavailable"
        ),
        FetchStatus::Failed => warn!(
            provider = %name,
            error = result.error.as_deref().unwrap_or_default(),
            "provider failed"
        ),
    }

    log.append(result);
    category
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockCommands, MockFs};
    use crate::collector::provider::testing::{Behavior, StubProvider};
    use crate::collector::provider::{Platform, TIMEOUT_ERROR};
    use crate::model::FieldValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn host() -> HostContext {
        HostContext::new(MockFs::new(), MockCommands::new())
    }

    fn fields(values: &[(&'static str, FieldValue)]) -> Behavior {
        Behavior::Fields(values.to_vec())
    }

    fn settings(timeout_ms: u64) -> CollectorSettings {
        CollectorSettings {
            timeout: Duration::from_millis(timeout_ms),
            max_concurrency: 4,
        }
    }

    #[tokio::test]
    async fn test_every_category_present_even_when_all_fail() {
        let registry = Registry::builder()
            .categories([Category::CpuInfo, Category::MemoryInfo])
            .register(StubProvider::new("lscpu", Category::CpuInfo, 1, Behavior::Fail("boom")))
            .register(StubProvider::new("meminfo", Category::MemoryInfo, 1, Behavior::Unavailable))
            .build()
            .unwrap();

        let snapshot = Collector::new(host(), settings(1000))
            .run(&registry, &[Category::CpuInfo, Category::MemoryInfo])
            .await
            .unwrap();

        assert_eq!(snapshot.records.len(), 2);
        assert!(snapshot.records.iter().all(|r| r.degraded && r.fields.is_empty()));
        assert_eq!(snapshot.status(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_partial_and_complete_status() {
        let registry = Registry::builder()
            .categories([Category::CpuInfo, Category::MemoryInfo])
            .register(StubProvider::new(
                "lscpu",
                Category::CpuInfo,
                1,
                fields(&[("logical_cpus", FieldValue::Int(4))]),
            ))
            .register(StubProvider::new("meminfo", Category::MemoryInfo, 1, Behavior::Fail("x")))
            .build()
            .unwrap();
        let collector = Collector::new(host(), settings(1000));

        let snapshot = collector
            .run(&registry, &[Category::CpuInfo, Category::MemoryInfo])
            .await
            .unwrap();
        assert_eq!(snapshot.status(), RunStatus::Partial);

        let snapshot = collector.run(&registry, &[Category::CpuInfo]).await.unwrap();
        assert_eq!(snapshot.status(), RunStatus::Complete);
        assert_eq!(snapshot.records.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_does_not_delay_siblings() {
        let registry = Registry::builder()
            .categories([Category::NetworkInfo, Category::DiskInfo])
            .register(StubProvider::new(
                "ip-addr",
                Category::NetworkInfo,
                1,
                Behavior::Sleep(Duration::from_secs(60)),
            ))
            .register(StubProvider::new(
                "netdev",
                Category::NetworkInfo,
                2,
                fields(&[("interface_count", FieldValue::Int(2))]),
            ))
            .register(StubProvider::new(
                "df",
                Category::DiskInfo,
                1,
                fields(&[("root_total_bytes", FieldValue::Int(1 << 30))]),
            ))
            .build()
            .unwrap();

        let start = Instant::now();
        let run = Collector::new(host(), settings(100))
            .collect(&registry, &[Category::NetworkInfo, Category::DiskInfo])
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));

        let timed_out = run
            .results
            .iter()
            .find(|r| r.provider_name == "ip-addr")
            .unwrap();
        assert_eq!(timed_out.status, FetchStatus::Failed);
        assert_eq!(timed_out.error.as_deref(), Some(TIMEOUT_ERROR));

        let network = run.snapshot.record(Category::NetworkInfo).unwrap();
        assert!(!network.degraded);
        assert_eq!(network.source_of("interface_count"), Some("netdev"));
        assert_eq!(run.snapshot.status(), RunStatus::Complete);
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let registry = Registry::builder()
            .categories([Category::SecurityPosture])
            .register(StubProvider::new("bad", Category::SecurityPosture, 1, Behavior::Panic))
            .register(StubProvider::new(
                "id",
                Category::SecurityPosture,
                2,
                fields(&[("effective_uid", FieldValue::Int(1001))]),
            ))
            .build()
            .unwrap();

        let run = Collector::new(host(), settings(1000))
            .collect(&registry, &[Category::SecurityPosture])
            .await
            .unwrap();

        let bad = run.results.iter().find(|r| r.provider_name == "bad").unwrap();
        assert_eq!(bad.status, FetchStatus::Failed);
        assert_eq!(bad.error.as_deref(), Some("provider panicked"));
        let record = run.snapshot.record(Category::SecurityPosture).unwrap();
        assert_eq!(record.get("effective_uid"), Some(&FieldValue::Int(1001)));
    }

    #[tokio::test]
    async fn test_unknown_category_fails_before_running() {
        let registry = Registry::builder()
            .categories([Category::MemoryInfo])
            .register(StubProvider::new(
                "meminfo",
                Category::MemoryInfo,
                1,
                fields(&[("total", FieldValue::from("16384 MB"))]),
            ))
            .build()
            .unwrap();

        let err = Collector::new(host(), settings(1000))
            .run(&registry, &[Category::MemoryInfo, Category::DiskInfo])
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownCategory(Category::DiskInfo));

        let err = Collector::new(host(), settings(1000))
            .run(&registry, &[])
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::NoCategories);
    }

    #[tokio::test]
    async fn test_every_provider_invoked_once_and_progress_reported() {
        let registry = Registry::builder()
            .categories([Category::CpuInfo, Category::MemoryInfo])
            .register(StubProvider::new(
                "a",
                Category::CpuInfo,
                1,
                fields(&[("x", FieldValue::Int(1))]),
            ))
            .register(
                StubProvider::new("b", Category::CpuInfo, 2, fields(&[("x", FieldValue::Int(2))]))
                    .on(Platform::MacOs),
            )
            .register(StubProvider::new(
                "c",
                Category::MemoryInfo,
                1,
                fields(&[("y", FieldValue::Int(3))]),
            ))
            .build()
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let collector = Collector::new(
            host(),
            CollectorSettings {
                timeout: Duration::from_secs(1),
                max_concurrency: 1,
            },
        )
        .with_progress(move |p| {
            assert_eq!(p.total, 2);
            assert!(p.completed <= 2);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        // Duplicate request entries are collapsed.
        let run = collector
            .collect(
                &registry,
                &[Category::MemoryInfo, Category::CpuInfo, Category::MemoryInfo],
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(run.results.len(), 3);
        assert_eq!(
            run.snapshot
                .records
                .iter()
                .map(|r| r.category)
                .collect::<Vec<_>>(),
            [Category::MemoryInfo, Category::CpuInfo]
        );
        let cpu = run.snapshot.record(Category::CpuInfo).unwrap();
        assert!(cpu.conflicts.is_empty());
        assert_eq!(cpu.attempts[1].status, FetchStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_host_identity_from_system_record() {
        let registry = Registry::builder()
            .categories([Category::SystemIdentity])
            .register(StubProvider::new(
                "uname",
                Category::SystemIdentity,
                1,
                fields(&[("hostname", FieldValue::from("runner-7"))]),
            ))
            .build()
            .unwrap();

        let snapshot = Collector::new(host(), settings(1000))
            .run(&registry, &[Category::SystemIdentity])
            .await
            .unwrap();
        assert_eq!(snapshot.metadata.host.as_deref(), Some("runner-7"));
    }

    #[test]
    fn test_result_log_append() {
        let log = RawResultLog::new();
        assert!(log.is_empty());
        log.append(RawResult::failed("a", Category::CpuInfo, 1, "x"));
        log.append(RawResult::failed("b", Category::DiskInfo, 1, "y"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.for_category(Category::DiskInfo).len(), 1);
        assert_eq!(log.into_results().len(), 2);
    }
}
