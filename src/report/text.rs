//! Human-readable report.
//!
//! Lossy by construction: only a curated subset of each record's fields is
//! shown. A curated field that was not collected is printed as `unknown`;
//! nothing is ever filled in from defaults.

use std::fmt::Write;

use crate::fmt::{format_bytes, format_duration, format_percent, truncate};
use crate::model::{Category, FieldValue, NormalizedRecord, Snapshot};

const UNKNOWN: &str = "unknown";
const LABEL_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 48;

#[derive(Clone, Copy)]
enum Unit {
    Plain,
    Bytes,
    Percent,
    Seconds,
}

struct Line {
    label: &'static str,
    field: &'static str,
    unit: Unit,
}

const fn line(label: &'static str, field: &'static str, unit: Unit) -> Line {
    Line { label, field, unit }
}

const SYSTEM_LINES: &[Line] = &[
    line("Hostname", "hostname", Unit::Plain),
    line("Operating system", "os_name", Unit::Plain),
    line("Kernel", "kernel_release", Unit::Plain),
    line("Architecture", "architecture", Unit::Plain),
    line("Vendor", "system_vendor", Unit::Plain),
    line("Product", "product_name", Unit::Plain),
    line("Uptime", "uptime_seconds", Unit::Seconds),
    line("Container", "container", Unit::Plain),
    line("CI provider", "ci_provider", Unit::Plain),
    line("Workflow", "workflow", Unit::Plain),
    line("Run id", "run_id", Unit::Plain),
];

const CPU_LINES: &[Line] = &[
    line("Model", "model_name", Unit::Plain),
    line("Vendor", "vendor", Unit::Plain),
    line("Logical CPUs", "logical_cpus", Unit::Plain),
    line("Physical cores", "physical_cores", Unit::Plain),
    line("Sockets", "sockets", Unit::Plain),
    line("Usage since boot", "usage_percent", Unit::Percent),
    line("Load (1m)", "load_1m", Unit::Plain),
    line("Load (5m)", "load_5m", Unit::Plain),
    line("Load (15m)", "load_15m", Unit::Plain),
];

const MEMORY_LINES: &[Line] = &[
    line("Total", "total_bytes", Unit::Bytes),
    line("Available", "available_bytes", Unit::Bytes),
    line("Usage", "usage_percent", Unit::Percent),
    line("Swap total", "swap_total_bytes", Unit::Bytes),
    line("Cgroup limit", "cgroup_limit_bytes", Unit::Bytes),
];

const DISK_LINES: &[Line] = &[
    line("Root filesystem", "root_filesystem", Unit::Plain),
    line("Root size", "root_total_bytes", Unit::Bytes),
    line("Root available", "root_available_bytes", Unit::Bytes),
    line("Root usage", "root_usage_percent", Unit::Percent),
    line("Devices", "devices", Unit::Plain),
    line("Total capacity", "total_capacity_bytes", Unit::Bytes),
];

const NETWORK_LINES: &[Line] = &[
    line("Interfaces", "interfaces", Unit::Plain),
    line("IPv4", "ipv4_addresses", Unit::Plain),
    line("IPv6", "ipv6_addresses", Unit::Plain),
    line("Received", "rx_bytes", Unit::Bytes),
    line("Transmitted", "tx_bytes", Unit::Bytes),
];

const SECURITY_LINES: &[Line] = &[
    line("Effective UID", "effective_uid", Unit::Plain),
    line("Running as root", "running_as_root", Unit::Plain),
    line("Seccomp", "seccomp_mode", Unit::Plain),
    line("ASLR", "aslr", Unit::Plain),
    line("Security modules", "lsm", Unit::Plain),
    line("SELinux", "selinux_mode", Unit::Plain),
    line("Passwordless sudo", "passwordless_sudo", Unit::Plain),
];

fn curated(category: Category) -> &'static [Line] {
    match category {
        Category::SystemIdentity => SYSTEM_LINES,
        Category::CpuInfo => CPU_LINES,
        Category::MemoryInfo => MEMORY_LINES,
        Category::DiskInfo => DISK_LINES,
        Category::NetworkInfo => NETWORK_LINES,
        Category::SecurityPosture => SECURITY_LINES,
    }
}

fn display(value: &FieldValue, unit: Unit) -> String {
    let formatted = match unit {
        Unit::Bytes => value
            .as_i64()
            .and_then(|v| u64::try_from(v).ok())
            .map(format_bytes),
        Unit::Percent => value.as_f64().map(format_percent),
        Unit::Seconds => value.as_i64().map(format_duration),
        Unit::Plain => None,
    };
    match formatted {
        Some(s) => s,
        // An empty list is a real answer ("no IPv6 addresses").
        None if matches!(value, FieldValue::List(items) if items.is_empty()) => "none".to_string(),
        None => truncate(&value.to_string(), VALUE_WIDTH),
    }
}

/// Renders the report. Infallible: writes into a `String` cannot fail.
pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let meta = &snapshot.metadata;

    let _ = writeln!(
        out,
        "Hardware report for {}",
        meta.host.as_deref().unwrap_or("unknown host")
    );
    let _ = writeln!(out, "Status:    {}", meta.status.as_str());
    let _ = writeln!(
        out,
        "Collected: {} ({} ms)",
        meta.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        meta.duration_ms
    );
    let _ = writeln!(out, "Version:   hwfacts {}", meta.tool_version);

    for record in &snapshot.records {
        out.push('\n');
        render_record(&mut out, record);
    }
    out
}

fn render_record(out: &mut String, record: &NormalizedRecord) {
    if record.degraded {
        let _ = writeln!(
            out,
            "{} (DEGRADED: no provider succeeded)",
            record.category.title()
        );
    } else {
        let _ = writeln!(
            out,
            "{} ({}/{} providers ok)",
            record.category.title(),
            record.succeeded(),
            record.attempts.len()
        );
    }

    for line in curated(record.category) {
        match record.get(line.field) {
            Some(value) => {
                let _ = writeln!(
                    out,
                    "  {:<lw$}{:<vw$}  [{}]",
                    line.label,
                    display(value, line.unit),
                    record.source_of(line.field).unwrap_or(UNKNOWN),
                    lw = LABEL_WIDTH,
                    vw = VALUE_WIDTH,
                );
            }
            None => {
                let _ = writeln!(out, "  {:<lw$}{}", line.label, UNKNOWN, lw = LABEL_WIDTH);
            }
        }
    }

    if !record.conflicts.is_empty() {
        let _ = writeln!(out, "  conflicts:");
        for conflict in &record.conflicts {
            let _ = writeln!(
                out,
                "    {}: {} reported {} (kept {} from {})",
                conflict.field_name,
                conflict.rejected_provider,
                truncate(&conflict.rejected_value.to_string(), VALUE_WIDTH),
                record
                    .get(&conflict.field_name)
                    .map(|v| truncate(&v.to_string(), VALUE_WIDTH))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                record.source_of(&conflict.field_name).unwrap_or(UNKNOWN),
            );
        }
    }

    if record.degraded {
        let _ = writeln!(out, "  attempts:");
        for attempt in &record.attempts {
            let _ = writeln!(
                out,
                "    {} {}: {}",
                attempt.provider,
                attempt.status.as_str(),
                attempt.error.as_deref().unwrap_or("-"),
            );
        }
    }
}
