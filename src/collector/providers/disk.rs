//! DiskInfo providers.

use async_trait::async_trait;

use super::{KIB, put};
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::{DiskStats, parse_diskstats, round2};
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{parse_df, parse_lsblk};
use crate::model::{Category, Fields};

/// `df -Pk /`.
pub struct DfRoot;

#[async_trait]
impl SourceProvider for DfRoot {
    fn name(&self) -> &str {
        "df-root"
    }
    fn category(&self) -> Category {
        Category::DiskInfo
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Unix
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let df = parse_df(&host.run("df", &["-Pk", "/"]).await?)?;

        let mut fields = Fields::new();
        put(&mut fields, "root_filesystem", df.filesystem);
        put(&mut fields, "root_total_bytes", df.total_kb.saturating_mul(KIB));
        put(&mut fields, "root_used_bytes", df.used_kb.saturating_mul(KIB));
        put(&mut fields, "root_available_bytes", df.available_kb.saturating_mul(KIB));
        // Same definition as df's capacity column, without its rounding up.
        let usable = df.used_kb + df.available_kb;
        if usable > 0 {
            put(
                &mut fields,
                "root_usage_percent",
                round2(df.used_kb as f64 / usable as f64 * 100.0),
            );
        }
        Ok(fields)
    }
}

/// Whole disks from `lsblk`.
pub struct Lsblk;

#[async_trait]
impl SourceProvider for Lsblk {
    fn name(&self) -> &str {
        "lsblk"
    }
    fn category(&self) -> Category {
        Category::DiskInfo
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let output = host
            .run("lsblk", &["-b", "-d", "-n", "-o", "NAME,SIZE,TYPE,ROTA"])
            .await?;
        let disks: Vec<_> = parse_lsblk(&output)?
            .into_iter()
            .filter(|d| d.is_disk())
            .collect();

        let mut fields = Fields::new();
        put(&mut fields, "device_count", disks.len());
        put(
            &mut fields,
            "total_capacity_bytes",
            disks.iter().map(|d| d.size_bytes).sum::<u64>(),
        );
        put(
            &mut fields,
            "rotational_devices",
            disks.iter().filter(|d| d.rotational).count(),
        );
        put(
            &mut fields,
            "devices",
            disks.into_iter().map(|d| d.name).collect::<Vec<_>>(),
        );
        Ok(fields)
    }
}

/// Whole-disk I/O counters from `/proc/diskstats`.
pub struct ProcfsDiskstats;

#[async_trait]
impl SourceProvider for ProcfsDiskstats {
    fn name(&self) -> &str {
        "procfs-diskstats"
    }
    fn category(&self) -> Category {
        Category::DiskInfo
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let content = host.read(&host.proc("diskstats"))?;
        let stats = parse_diskstats(&content)?;
        let disks = whole_disks(&stats);

        let mut fields = Fields::new();
        put(&mut fields, "device_count", disks.len());
        // Every block device the kernel tracks, partitions and loop devices included.
        put(
            &mut fields,
            "diskstats_entries",
            content.lines().filter(|l| !l.trim().is_empty()).count(),
        );
        put(
            &mut fields,
            "reads_completed",
            disks.iter().fold(0u64, |acc, d| acc.saturating_add(d.reads)),
        );
        put(
            &mut fields,
            "writes_completed",
            disks.iter().fold(0u64, |acc, d| acc.saturating_add(d.writes)),
        );
        put(
            &mut fields,
            "devices",
            disks.iter().map(|d| d.device.clone()).collect::<Vec<_>>(),
        );
        Ok(fields)
    }
}

/// Drops pseudo devices and partitions. A device is a partition when it
/// extends another listed name with a number (`sda1`, `nvme0n1p2`).
fn whole_disks(stats: &[DiskStats]) -> Vec<&DiskStats> {
    let real: Vec<&DiskStats> = stats.iter().filter(|d| !d.is_virtual()).collect();
    real.iter()
        .copied()
        .filter(|d| {
            !real.iter().any(|parent| {
                d.device.len() > parent.device.len()
                    && d.device.starts_with(&parent.device)
                    && d.device.ends_with(|c: char| c.is_ascii_digit())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockHost;
    use crate::model::FieldValue;

    fn list(items: &[&str]) -> FieldValue {
        FieldValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_df_root() {
        let fields = DfRoot.fetch(&MockHost::typical_linux().context()).await.unwrap();
        assert_eq!(fields["root_filesystem"], FieldValue::from("/dev/root"));
        assert_eq!(fields["root_total_bytes"], FieldValue::Int(76_026_616 * 1024));
        assert_eq!(fields["root_usage_percent"], FieldValue::Float(69.57));
    }

    #[tokio::test]
    async fn test_lsblk_counts_disks_only() {
        let fields = Lsblk.fetch(&MockHost::typical_linux().context()).await.unwrap();
        assert_eq!(fields["devices"], list(&["sda", "sdb"]));
        assert_eq!(fields["device_count"], FieldValue::Int(2));
        assert_eq!(
            fields["total_capacity_bytes"],
            FieldValue::Int(2 * 80_530_636_800)
        );
        assert_eq!(fields["rotational_devices"], FieldValue::Int(0));
    }

    #[tokio::test]
    async fn test_diskstats_matches_lsblk_devices() {
        let host = MockHost::typical_linux().context();
        let fields = ProcfsDiskstats.fetch(&host).await.unwrap();
        assert_eq!(fields["devices"], list(&["sda", "sdb"]));
        assert_eq!(fields["reads_completed"], FieldValue::Int(12345 + 2000));
        assert_eq!(fields["writes_completed"], FieldValue::Int(6789 + 1000));
        assert_eq!(fields["device_count"], FieldValue::Int(2));
        assert_eq!(fields["diskstats_entries"], FieldValue::Int(5));

        let lsblk = Lsblk.fetch(&host).await.unwrap();
        assert_eq!(fields["device_count"], lsblk["device_count"]);
    }

    #[test]
    fn test_whole_disks_nvme() {
        let stats = parse_diskstats(
            "\
 259       0 nvme0n1 1 0 0 0 1 0 0 0 0 0 0 0 0 0 0
 259       1 nvme0n1p1 1 0 0 0 1 0 0 0 0 0 0 0 0 0 0
   1       0 ram0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
",
        )
        .unwrap();
        let disks: Vec<&str> = whole_disks(&stats)
            .iter()
            .map(|d| d.device.as_str())
            .collect();
        assert_eq!(disks, ["nvme0n1"]);
    }
}
