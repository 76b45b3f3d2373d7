//! hwfacts - host hardware fact collector.
//!
//! Runs every registered provider once, reconciles the results per category
//! and writes `hardware-snapshot.json` and `hardware-report.txt`. A progress
//! line per category goes to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use hwfacts::collector::{CategoryProgress, Collector, HostContext};
use hwfacts::config::{Config, Overrides};
use hwfacts::error::{EXIT_ALL_FAILED, EXIT_OK, Error};
use hwfacts::model::{Category, RunStatus};
use hwfacts::report::{CiEnvironment, render, write_artifacts};

/// Host hardware fact collector.
#[derive(Parser)]
#[command(
    name = "hwfacts",
    about = "Collects host hardware facts from multiple sources",
    version
)]
struct Args {
    /// Directory for the snapshot and report files.
    #[arg(short, long, env = "HWFACTS_OUTPUT_DIR", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// JSON config file.
    #[arg(short, long, env = "HWFACTS_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Categories to collect (repeatable or comma-separated). Default: all.
    #[arg(long = "category", value_delimiter = ',', value_name = "NAME")]
    categories: Vec<Category>,

    /// Default per-provider timeout in milliseconds.
    #[arg(long, env = "HWFACTS_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Maximum number of providers running at once.
    #[arg(long, env = "HWFACTS_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Also register providers that use `sudo -n`.
    #[arg(long)]
    allow_elevated: bool,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Path to /sys filesystem (for testing/mocking).
    #[arg(long, default_value = "/sys")]
    sys_path: PathBuf,

    /// Do not write GitHub Actions step outputs.
    #[arg(long)]
    no_ci_output: bool,

    /// Print the human-readable report to stdout.
    #[arg(long)]
    print_report: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("hwfacts={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_progress(progress: CategoryProgress<'_>) {
    let record = progress.record;
    let outcome = if record.degraded { "degraded" } else { "ok" };
    let conflicts = match record.conflicts.len() {
        0 => String::new(),
        1 => ", 1 conflict".to_string(),
        n => format!(", {} conflicts", n),
    };
    println!(
        "[{}/{}] {}: {} ({}/{} providers{})",
        progress.completed,
        progress.total,
        record.category,
        outcome,
        record.succeeded(),
        record.attempts.len(),
        conflicts
    );
}

fn run(args: Args) -> hwfacts::Result<u8> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    let config = config.with_overrides(Overrides {
        timeout_ms: args.timeout_ms,
        max_concurrency: args.max_concurrency,
        output_dir: args.output_dir.clone(),
        allow_elevated: args.allow_elevated,
    })?;

    let categories = if args.categories.is_empty() {
        Category::ALL.to_vec()
    } else {
        args.categories.clone()
    };
    let registry = config.build_registry(&categories)?;

    info!("hwfacts {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: timeout={}ms, max_concurrency={}, output={}, providers={}",
        config.timeout_ms,
        config.max_concurrency,
        config.output_dir.display(),
        registry.len()
    );

    let host = HostContext::local()
        .with_proc_path(args.proc_path.clone())
        .with_sys_path(args.sys_path.clone());
    let env = host.env_vars().clone();
    let collector = Collector::new(host, config.collector_settings()).with_progress(print_progress);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;
    let snapshot = runtime.block_on(collector.run(&registry, &categories))?;

    let rendered = render(&snapshot)?;
    if args.print_report {
        print!("{}", rendered.text);
    }

    let written = write_artifacts(&config.output_dir, &config.artifact_names(), &rendered);

    if !args.no_ci_output {
        if let Some(ci) = CiEnvironment::detect(&env) {
            match ci.emit(&snapshot) {
                Ok(keys) => info!("Wrote {} CI outputs to {}", keys, ci.output_file().display()),
                Err(e) => warn!("CI outputs not written: {}", e),
            }
        }
    }

    match written {
        Ok(paths) => {
            info!(
                "Artifacts written: {}, {}",
                paths.snapshot.display(),
                paths.report.display()
            );
        }
        Err(e) => {
            // The collected data is still shown.
            if !args.print_report {
                print!("{}", rendered.text);
            }
            return Err(e.into());
        }
    }

    Ok(match snapshot.status() {
        RunStatus::Complete | RunStatus::Partial => EXIT_OK,
        RunStatus::Failed => EXIT_ALL_FAILED,
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
