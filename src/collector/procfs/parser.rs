//! Parsers for `/proc` and `/etc` files.
//!
//! These are pure functions that parse the content of various files into
//! structured data. They are designed to be easily testable with string inputs.

use std::collections::{BTreeMap, HashSet};

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

// ============ Memory Parser ============

/// Parsed data from `/proc/meminfo`. Values are in kB; a key that is missing
/// or unreadable stays `None`.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: Option<u64>,
    pub mem_available: Option<u64>,
    pub buffers: Option<u64>,
    pub cached: Option<u64>,
    pub swap_total: Option<u64>,
    pub swap_free: Option<u64>,
}

impl MemInfo {
    /// `(MemTotal - MemAvailable) / MemTotal * 100`, rounded to two decimals.
    pub fn usage_percent(&self) -> Option<f64> {
        let available = self.mem_available?;
        if self.mem_total == 0 {
            return None;
        }
        let used = self.mem_total.saturating_sub(available);
        Some(round2(used as f64 / self.mem_total as f64 * 100.0))
    }
}

/// Parses `/proc/meminfo` content. Only `MemTotal` is required.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut total = None;

    let parse_kb = |line: &str| -> Option<u64> {
        line.split_whitespace().nth(1).and_then(|s| s.parse().ok())
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            total = Some(
                parse_kb(line).ok_or_else(|| ParseError::new("invalid MemTotal in meminfo"))?,
            );
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line);
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line);
        } else if line.starts_with("SwapTotal:") {
            info.swap_total = parse_kb(line);
        } else if line.starts_with("SwapFree:") {
            info.swap_free = parse_kb(line);
        }
    }

    info.mem_total = total.ok_or_else(|| ParseError::new("MemTotal missing in meminfo"))?;
    Ok(info)
}

// ============ CPU Parsers ============

/// Aggregate CPU counters from the first `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Sum of all counters, `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .try_fold(self.user, u64::checked_add)
    }

    /// Busy share since boot: `(total - idle) / total * 100`, two decimals.
    pub fn usage_percent(&self) -> Option<f64> {
        let total = self.total()?;
        if total == 0 {
            return None;
        }
        let busy = total.saturating_sub(self.idle);
        Some(round2(busy as f64 / total as f64 * 100.0))
    }
}

/// Global stats from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpu: CpuStat,
    /// Number of per-CPU `cpuN` lines.
    pub cpu_lines: usize,
    pub ctxt: u64,
    pub btime: u64,
    pub processes: u64,
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();
    let mut seen_aggregate = false;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        match parts[0] {
            "cpu" => {
                seen_aggregate = true;
                stat.cpu = CpuStat {
                    user: get_val(1),
                    nice: get_val(2),
                    system: get_val(3),
                    idle: get_val(4),
                    iowait: get_val(5),
                    irq: get_val(6),
                    softirq: get_val(7),
                    steal: get_val(8),
                };
            }
            name if name.starts_with("cpu") => stat.cpu_lines += 1,
            "ctxt" => stat.ctxt = get_val(1),
            "btime" => stat.btime = get_val(1),
            "processes" => stat.processes = get_val(1),
            _ => {}
        }
    }

    if !seen_aggregate {
        return Err(ParseError::new("aggregate cpu line missing in stat"));
    }
    if stat.cpu.total().is_none() {
        return Err(ParseError::new("cpu counters overflow in stat"));
    }
    Ok(stat)
}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u32,
    pub total: u32,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    // Format: running/total
    let (running, total) = if let Some((r, t)) = parts[3].split_once('/') {
        (r.parse().unwrap_or(0), t.parse().unwrap_or(0))
    } else {
        (0, 0)
    };

    Ok(LoadAvg {
        load1,
        load5,
        load15,
        running,
        total,
    })
}

/// Summary of `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuInfo {
    pub model_name: Option<String>,
    pub vendor: Option<String>,
    /// Number of `processor` entries.
    pub logical_cpus: usize,
    /// Distinct `(physical id, core id)` pairs, when the kernel reports them.
    pub physical_cores: Option<usize>,
    /// Distinct `physical id` values.
    pub sockets: Option<usize>,
    pub mhz: Option<f64>,
    pub cache_size: Option<String>,
}

/// Parses `/proc/cpuinfo` content.
///
/// x86 reports `model name`; ARM kernels often only report `Hardware` or
/// `CPU part`, in which case the model is left empty.
pub fn parse_cpuinfo(content: &str) -> Result<CpuInfo, ParseError> {
    let mut info = CpuInfo::default();
    let mut sockets: HashSet<String> = HashSet::new();
    let mut cores: HashSet<(String, String)> = HashSet::new();
    let mut physical_id: Option<String> = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "processor" => {
                info.logical_cpus += 1;
                physical_id = None;
            }
            "model name" | "Hardware" if info.model_name.is_none() && !value.is_empty() => {
                info.model_name = Some(value.to_string());
            }
            "vendor_id" if info.vendor.is_none() => info.vendor = Some(value.to_string()),
            "cpu MHz" if info.mhz.is_none() => info.mhz = value.parse().ok(),
            "cache size" if info.cache_size.is_none() => {
                info.cache_size = Some(value.to_string());
            }
            "physical id" => {
                sockets.insert(value.to_string());
                physical_id = Some(value.to_string());
            }
            "core id" => {
                let socket = physical_id.clone().unwrap_or_default();
                cores.insert((socket, value.to_string()));
            }
            _ => {}
        }
    }

    if info.logical_cpus == 0 {
        return Err(ParseError::new("no processor entries in cpuinfo"));
    }
    if !sockets.is_empty() {
        info.sockets = Some(sockets.len());
    }
    if !cores.is_empty() {
        info.physical_cores = Some(cores.len());
    }
    Ok(info)
}

// ============ Identity Parsers ============

/// Selected keys of `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsRelease {
    pub name: Option<String>,
    pub id: Option<String>,
    pub version_id: Option<String>,
    pub pretty_name: Option<String>,
}

/// Parses `/etc/os-release` (shell-style `KEY=value` lines).
pub fn parse_os_release(content: &str) -> Result<OsRelease, ParseError> {
    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            vars.insert(key.trim(), value.to_string());
        }
    }

    if vars.is_empty() {
        return Err(ParseError::new("os-release has no entries"));
    }
    Ok(OsRelease {
        name: vars.remove("NAME"),
        id: vars.remove("ID"),
        version_id: vars.remove("VERSION_ID"),
        pretty_name: vars.remove("PRETTY_NAME"),
    })
}

/// Parses `/proc/uptime`, returning whole seconds since boot.
pub fn parse_uptime(content: &str) -> Result<u64, ParseError> {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| secs as u64)
        .ok_or_else(|| ParseError::new("invalid uptime format"))
}

// ============ Process Status Parser ============

/// Security-relevant lines of `/proc/[pid]/status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatus {
    pub effective_uid: Option<u32>,
    pub no_new_privs: Option<bool>,
    pub seccomp: Option<u32>,
    /// Hex capability mask, as printed by the kernel.
    pub cap_eff: Option<String>,
}

/// Parses `/proc/[pid]/status` content.
///
/// `Uid:` lists real, effective, saved and filesystem UIDs; the second one is
/// kept.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus, ParseError> {
    let mut status = ProcStatus::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Uid" => {
                status.effective_uid = value.split_whitespace().nth(1).and_then(|s| s.parse().ok());
            }
            "NoNewPrivs" => status.no_new_privs = value.parse::<u8>().ok().map(|v| v != 0),
            "Seccomp" => status.seccomp = value.parse().ok(),
            "CapEff" => status.cap_eff = Some(value.to_string()),
            _ => {}
        }
    }

    if status.effective_uid.is_none() {
        return Err(ParseError::new("Uid line missing in status"));
    }
    Ok(status)
}

// ============ Disk Stats Parser ============

/// Parsed data from `/proc/diskstats`.
#[derive(Debug, Clone, Default)]
pub struct DiskStats {
    /// Block device major number.
    pub major: u32,
    /// Block device minor number.
    pub minor: u32,
    /// Device name (sda, nvme0n1, etc.)
    pub device: String,
    /// Number of reads completed
    pub reads: u64,
    /// Number of sectors read
    pub read_sectors: u64,
    /// Number of writes completed
    pub writes: u64,
    /// Number of sectors written
    pub write_sectors: u64,
}

impl DiskStats {
    /// Pseudo devices that carry no hardware information.
    pub fn is_virtual(&self) -> bool {
        self.device.starts_with("loop") || self.device.starts_with("ram")
    }
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStats>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let major: u32 = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0);
        let minor: u32 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        disks.push(DiskStats {
            major,
            minor,
            device: parts[2].to_string(),
            reads: get_val(3),
            read_sectors: get_val(5),
            writes: get_val(7),
            write_sectors: get_val(9),
        });
    }

    Ok(disks)
}

// ============ Network Device Stats Parser ============

/// Parsed data from `/proc/net/dev`.
#[derive(Debug, Clone, Default)]
pub struct NetDevStats {
    /// Interface name (eth0, lo, etc.)
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();

    for line in content.lines() {
        // Skip header lines
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }

        let Some((interface, counters)) = line.split_once(':') else {
            continue;
        };
        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        devices.push(NetDevStats {
            interface: interface.trim().to_string(),
            rx_bytes: get_val(0),
            rx_packets: get_val(1),
            tx_bytes: get_val(8),
            tx_packets: get_val(9),
        });
    }

    Ok(devices)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, Some(8192000));
        assert_eq!(info.mem_available, Some(12000000));
        assert_eq!(info.buffers, Some(512000));
        assert_eq!(info.cached, Some(2048000));
        assert_eq!(info.swap_total, Some(4096000));
        assert_eq!(info.usage_percent(), Some(26.76));
    }

    #[test]
    fn test_parse_meminfo_without_total() {
        let err = parse_meminfo("MemFree: 100 kB\n").unwrap_err();
        assert!(err.message.contains("MemTotal"));
        assert_eq!(MemInfo::default().usage_percent(), None);

        let err = parse_meminfo("MemTotal: lots kB\n").unwrap_err();
        assert!(err.message.contains("invalid MemTotal"));
    }

    #[test]
    fn test_parse_meminfo_without_available() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
SwapTotal:             0 kB
SwapFree:       garbage kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, Some(8192000));
        assert_eq!(info.mem_available, None);
        assert_eq!(info.swap_total, Some(0));
        assert_eq!(info.swap_free, None);
        assert_eq!(info.usage_percent(), None);
    }

    #[test]
    fn test_parse_global_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 100 200 0 0 0
cpu0 2500 125 750 20000 250 25 50 0 0 0
cpu1 2500 125 750 20000 250 25 50 0 0 0
intr 123456 0 0 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
";
        let stat = parse_global_stat(content).unwrap();

        assert_eq!(stat.cpu.user, 10000);
        assert_eq!(stat.cpu.idle, 80000);
        assert_eq!(stat.cpu.total(), Some(94800));
        assert_eq!(stat.cpu_lines, 2);
        assert_eq!(stat.ctxt, 500000);
        assert_eq!(stat.btime, 1700000000);
        assert_eq!(stat.processes, 10000);
        // (94800 - 80000) / 94800
        assert_eq!(stat.cpu.usage_percent(), Some(15.61));
    }

    #[test]
    fn test_parse_global_stat_counter_overflow() {
        let content = "cpu  18446744073709551615 1 0 0 0 0 0 0 0 0\n";
        let err = parse_global_stat(content).unwrap_err();
        assert!(err.message.contains("overflow"));

        let stat = CpuStat {
            user: u64::MAX,
            idle: 1,
            ..CpuStat::default()
        };
        assert_eq!(stat.total(), None);
        assert_eq!(stat.usage_percent(), None);
    }

    #[test]
    fn test_parse_global_stat_missing_aggregate() {
        assert!(parse_global_stat("ctxt 5\n").is_err());
        assert_eq!(CpuStat::default().usage_percent(), None);
    }

    #[test]
    fn test_parse_loadavg() {
        let info = parse_loadavg("0.15 0.10 0.05 1/150 1234\n").unwrap();
        assert!((info.load1 - 0.15).abs() < 0.001);
        assert!((info.load5 - 0.10).abs() < 0.001);
        assert!((info.load15 - 0.05).abs() < 0.001);
        assert_eq!(info.running, 1);
        assert_eq!(info.total, 150);

        assert!(parse_loadavg("garbage").is_err());
        assert!(parse_loadavg("x 0.1 0.1 1/2 3").is_err());
    }

    #[test]
    fn test_parse_cpuinfo_x86() {
        let content = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz
cpu MHz\t\t: 2793.437
cache size\t: 49152 KB
physical id\t: 0
core id\t\t: 0

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz
cpu MHz\t\t: 2793.437
physical id\t: 0
core id\t\t: 0

processor\t: 2
physical id\t: 0
core id\t\t: 1

processor\t: 3
physical id\t: 0
core id\t\t: 1
";
        let info = parse_cpuinfo(content).unwrap();

        assert_eq!(
            info.model_name.as_deref(),
            Some("Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz")
        );
        assert_eq!(info.vendor.as_deref(), Some("GenuineIntel"));
        assert_eq!(info.logical_cpus, 4);
        assert_eq!(info.physical_cores, Some(2));
        assert_eq!(info.sockets, Some(1));
        assert_eq!(info.mhz, Some(2793.437));
        assert_eq!(info.cache_size.as_deref(), Some("49152 KB"));
    }

    #[test]
    fn test_parse_cpuinfo_arm() {
        let content = "\
processor\t: 0
BogoMIPS\t: 50.00
CPU part\t: 0xd0c

processor\t: 1
BogoMIPS\t: 50.00
";
        let info = parse_cpuinfo(content).unwrap();
        assert_eq!(info.logical_cpus, 2);
        assert_eq!(info.model_name, None);
        assert_eq!(info.physical_cores, None);
        assert_eq!(info.sockets, None);

        assert!(parse_cpuinfo("").is_err());
    }

    #[test]
    fn test_parse_os_release() {
        let content = r#"
# comment
NAME="Ubuntu"
VERSION="22.04.4 LTS (Jammy Jellyfish)"
ID=ubuntu
VERSION_ID="22.04"
PRETTY_NAME='Ubuntu 22.04.4 LTS'
"#;
        let release = parse_os_release(content).unwrap();
        assert_eq!(release.name.as_deref(), Some("Ubuntu"));
        assert_eq!(release.id.as_deref(), Some("ubuntu"));
        assert_eq!(release.version_id.as_deref(), Some("22.04"));
        assert_eq!(release.pretty_name.as_deref(), Some("Ubuntu 22.04.4 LTS"));

        assert!(parse_os_release("\n# nothing\n").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("350735.47 234388.90\n").unwrap(), 350735);
        assert!(parse_uptime("").is_err());
    }

    #[test]
    fn test_parse_proc_status() {
        let content = "\
Name:\thwfacts
Umask:\t0022
State:\tR (running)
Uid:\t1000\t0\t0\t0
Gid:\t1000\t1000\t1000\t1000
CapEff:\t0000000000000000
NoNewPrivs:\t1
Seccomp:\t2
";
        let status = parse_proc_status(content).unwrap();
        assert_eq!(status.effective_uid, Some(0));
        assert_eq!(status.no_new_privs, Some(true));
        assert_eq!(status.seccomp, Some(2));
        assert_eq!(status.cap_eff.as_deref(), Some("0000000000000000"));

        assert!(parse_proc_status("Name:\tx\n").is_err());
    }

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   7       0 loop0 52 0 2096 8 0 0 0 0 0 16 8 0 0 0 0
   8       0 sda 1234 0 56789 100 5678 0 98765 200 0 150 300 0 0 0 0
   8       1 sda1 1000 0 50000 80 5000 0 90000 180 0 130 260 0 0 0 0
 259       0 nvme0n1 9999 0 123456 500 8888 0 654321 400 5 1000 2000 0 0 0 0
   1       0 ram0 0 0
";
        let disks = parse_diskstats(content).unwrap();

        assert_eq!(disks.len(), 4);
        assert!(disks[0].is_virtual());

        assert_eq!(disks[1].major, 8);
        assert_eq!(disks[1].minor, 0);
        assert_eq!(disks[1].device, "sda");
        assert_eq!(disks[1].reads, 1234);
        assert_eq!(disks[1].read_sectors, 56789);
        assert_eq!(disks[1].writes, 5678);
        assert_eq!(disks[1].write_sectors, 98765);
        assert!(!disks[1].is_virtual());

        assert_eq!(disks[3].major, 259);
        assert_eq!(disks[3].device, "nvme0n1");
        assert_eq!(disks[3].reads, 9999);
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
  eth0: 9876543     5678    1    2    0     0          0        10 87654321     4321    3    4    0     0       0          0
";
        let devices = parse_net_dev(content).unwrap();

        assert_eq!(devices.len(), 2);

        assert_eq!(devices[0].interface, "lo");
        assert_eq!(devices[0].rx_bytes, 1234567);
        assert_eq!(devices[0].rx_packets, 1234);

        assert_eq!(devices[1].interface, "eth0");
        assert_eq!(devices[1].rx_bytes, 9876543);
        assert_eq!(devices[1].tx_bytes, 87654321);
        assert_eq!(devices[1].tx_packets, 4321);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(26.7578125), 26.76);
        assert_eq!(round2(100.0), 100.0);
    }
}
