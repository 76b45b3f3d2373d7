//! Pure parsers for command output.

use std::collections::BTreeMap;

use crate::collector::procfs::ParseError;

// ============ lscpu ============

/// Selected keys of `lscpu` output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lscpu {
    pub architecture: Option<String>,
    pub logical_cpus: Option<u64>,
    pub model_name: Option<String>,
    pub vendor: Option<String>,
    pub sockets: Option<u64>,
    pub cores_per_socket: Option<u64>,
    pub threads_per_core: Option<u64>,
    pub max_mhz: Option<f64>,
    pub virtualization: Option<String>,
    pub hypervisor_vendor: Option<String>,
}

/// Parses `lscpu` output (`Key:   value` lines).
///
/// Newer util-linux indents nested keys; indentation is ignored and the
/// first occurrence of a key wins.
pub fn parse_lscpu(output: &str) -> Result<Lscpu, ParseError> {
    let mut values: BTreeMap<&str, &str> = BTreeMap::new();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            values.entry(key.trim()).or_insert(value);
        }
    }

    if values.is_empty() {
        return Err(ParseError::new("empty lscpu output"));
    }

    let text = |key: &str| values.get(key).map(|v| (*v).to_string());
    let number = |key: &str| values.get(key).and_then(|v| v.parse().ok());

    Ok(Lscpu {
        architecture: text("Architecture"),
        logical_cpus: number("CPU(s)"),
        model_name: text("Model name"),
        vendor: text("Vendor ID"),
        sockets: number("Socket(s)"),
        cores_per_socket: number("Core(s) per socket"),
        threads_per_core: number("Thread(s) per core"),
        max_mhz: values.get("CPU max MHz").and_then(|v| v.parse().ok()),
        virtualization: text("Virtualization"),
        hypervisor_vendor: text("Hypervisor vendor"),
    })
}

// ============ free ============

/// Byte figures from `free -b`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeOutput {
    pub total: u64,
    pub used: Option<u64>,
    pub free: Option<u64>,
    /// Missing on procps releases older than 3.3.10.
    pub available: Option<u64>,
    pub swap_total: Option<u64>,
    pub swap_free: Option<u64>,
}

/// Parses `free -b` output. Columns are located by header name.
pub fn parse_free(output: &str) -> Result<FreeOutput, ParseError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| ParseError::new("empty free output"))?
        .split_whitespace()
        .collect();
    let column = |name: &str| header.iter().position(|h| *h == name);

    let mut result = None;
    let mut swap = None;
    for line in lines {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let values: Vec<u64> = parts.filter_map(|v| v.parse().ok()).collect();
        match label {
            "Mem:" => result = Some(values),
            "Swap:" => swap = Some(values),
            _ => {}
        }
    }

    let mem = result.ok_or_else(|| ParseError::new("Mem: line missing in free output"))?;
    let at = |name: &str, row: &[u64]| column(name).and_then(|i| row.get(i).copied());

    Ok(FreeOutput {
        total: at("total", &mem).ok_or_else(|| ParseError::new("total column missing"))?,
        used: at("used", &mem),
        free: at("free", &mem),
        available: at("available", &mem),
        swap_total: swap.as_deref().and_then(|s| at("total", s)),
        swap_free: swap.as_deref().and_then(|s| at("free", s)),
    })
}

// ============ df ============

/// One filesystem line of `df -Pk`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DfEntry {
    pub filesystem: String,
    pub total_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
    pub capacity_percent: Option<u64>,
    pub mount_point: String,
}

/// Parses POSIX `df -Pk <path>` output and returns the first filesystem.
pub fn parse_df(output: &str) -> Result<DfEntry, ParseError> {
    let line = output
        .lines()
        .skip(1)
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ParseError::new("df printed no filesystem"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return Err(ParseError::new(format!("malformed df line '{line}'")));
    }
    let number = |idx: usize, name: &str| -> Result<u64, ParseError> {
        parts[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid df {name}")))
    };

    Ok(DfEntry {
        filesystem: parts[0].to_string(),
        total_kb: number(1, "size")?,
        used_kb: number(2, "used")?,
        available_kb: number(3, "available")?,
        capacity_percent: parts[4].trim_end_matches('%').parse().ok(),
        // Mount points may contain spaces.
        mount_point: parts[5..].join(" "),
    })
}

// ============ lsblk ============

/// One device line of `lsblk -b -d -n -o NAME,SIZE,TYPE,ROTA`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDevice {
    pub name: String,
    pub size_bytes: u64,
    pub kind: String,
    pub rotational: bool,
}

impl BlockDevice {
    pub fn is_disk(&self) -> bool {
        self.kind == "disk"
    }
}

/// Parses headerless `lsblk -b -d -n -o NAME,SIZE,TYPE,ROTA` output.
pub fn parse_lsblk(output: &str) -> Result<Vec<BlockDevice>, ParseError> {
    let mut devices = Vec::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(ParseError::new(format!("malformed lsblk line '{line}'")));
        }
        devices.push(BlockDevice {
            name: parts[0].to_string(),
            size_bytes: parts[1]
                .parse()
                .map_err(|_| ParseError::new(format!("invalid lsblk size '{}'", parts[1])))?,
            kind: parts[2].to_string(),
            rotational: parts[3] == "1",
        });
    }
    Ok(devices)
}

// ============ ip / hostname ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrFamily {
    V4,
    V6,
}

/// One address line of `ip -o addr show`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceAddr {
    pub interface: String,
    pub family: AddrFamily,
    /// Address without the prefix length.
    pub address: String,
}

/// Parses `ip -o addr show` output.
///
/// Format: "2: eth0    inet 10.1.0.4/16 brd 10.1.255.255 scope global eth0\ ..."
pub fn parse_ip_addr(output: &str) -> Result<Vec<InterfaceAddr>, ParseError> {
    let mut addrs = Vec::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let family = match parts[2] {
            "inet" => AddrFamily::V4,
            "inet6" => AddrFamily::V6,
            _ => continue,
        };
        let interface = parts[1].trim_end_matches(':');
        let address = parts[3].split('/').next().unwrap_or(parts[3]);
        addrs.push(InterfaceAddr {
            interface: interface.to_string(),
            family,
            address: address.to_string(),
        });
    }
    if addrs.is_empty() && !output.trim().is_empty() {
        return Err(ParseError::new("no addresses in ip output"));
    }
    Ok(addrs)
}

/// Splits `hostname -I` output into IPv4 and IPv6 addresses.
pub fn parse_hostname_ips(output: &str) -> (Vec<String>, Vec<String>) {
    output
        .split_whitespace()
        .map(str::to_string)
        .partition(|addr| !addr.contains(':'))
}

// ============ uname / id / single values ============

/// Output of `uname -snrm`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uname {
    pub kernel_name: String,
    pub hostname: String,
    pub kernel_release: String,
    pub machine: String,
}

/// Parses `uname -snrm` output.
pub fn parse_uname(output: &str) -> Result<Uname, ParseError> {
    let parts: Vec<&str> = output.split_whitespace().collect();
    if parts.len() != 4 {
        return Err(ParseError::new(format!(
            "expected 4 fields from uname, got {}",
            parts.len()
        )));
    }
    Ok(Uname {
        kernel_name: parts[0].to_string(),
        hostname: parts[1].to_string(),
        kernel_release: parts[2].to_string(),
        machine: parts[3].to_string(),
    })
}

/// Parses a single unsigned integer, as printed by `id -u` or `sysctl -n`.
pub fn parse_number(output: &str) -> Result<u64, ParseError> {
    let trimmed = output.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::new(format!("expected a number, got '{trimmed}'")))
}

/// Parses single-line text output, skipping `#` comment lines that
/// `dmidecode` prints on some systems.
pub fn parse_single_value(output: &str) -> Result<String, ParseError> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .ok_or_else(|| ParseError::new("command printed nothing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lscpu() {
        let output = "\
Architecture:                       x86_64
  CPU op-mode(s):                   32-bit, 64-bit
CPU(s):                             4
  On-line CPU(s) list:              0-3
Vendor ID:                          GenuineIntel
  Model name:                       Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz
    Thread(s) per core:             2
    Core(s) per socket:             2
    Socket(s):                      1
    CPU max MHz:                    3500.0000
Virtualization:                     VT-x
Hypervisor vendor:                  Microsoft
";
        let info = parse_lscpu(output).unwrap();
        assert_eq!(info.architecture.as_deref(), Some("x86_64"));
        assert_eq!(info.logical_cpus, Some(4));
        assert_eq!(info.vendor.as_deref(), Some("GenuineIntel"));
        assert_eq!(
            info.model_name.as_deref(),
            Some("Intel(R) Xeon(R) Platinum 8370C CPU @ 2.80GHz")
        );
        assert_eq!(info.threads_per_core, Some(2));
        assert_eq!(info.cores_per_socket, Some(2));
        assert_eq!(info.sockets, Some(1));
        assert_eq!(info.max_mhz, Some(3500.0));
        assert_eq!(info.virtualization.as_deref(), Some("VT-x"));
        assert_eq!(info.hypervisor_vendor.as_deref(), Some("Microsoft"));

        assert!(parse_lscpu("").is_err());
    }

    #[test]
    fn test_parse_free() {
        let output = "\
               total        used        free      shared  buff/cache   available
Mem:     16777216000  4000000000  8000000000    10000000  4777216000 12000000000
Swap:     4294967296           0  4294967296
";
        let free = parse_free(output).unwrap();
        assert_eq!(free.total, 16777216000);
        assert_eq!(free.used, Some(4000000000));
        assert_eq!(free.free, Some(8000000000));
        assert_eq!(free.available, Some(12000000000));
        assert_eq!(free.swap_total, Some(4294967296));
        assert_eq!(free.swap_free, Some(4294967296));
    }

    #[test]
    fn test_parse_free_old_layout() {
        let output = "\
             total       used       free     shared    buffers     cached
Mem:    8254390272 7902273536  352116736          0  195526656 5318311936
";
        let free = parse_free(output).unwrap();
        assert_eq!(free.total, 8254390272);
        assert_eq!(free.available, None);
        assert_eq!(free.swap_total, None);

        // A row shorter than the header leaves the missing columns out.
        let output = "\
               total        used        free
Mem:     16777216000  4000000000
";
        let free = parse_free(output).unwrap();
        assert_eq!(free.used, Some(4000000000));
        assert_eq!(free.free, None);

        assert!(parse_free("").is_err());
        assert!(parse_free("  total used\n").is_err());
    }

    #[test]
    fn test_parse_df() {
        let output = "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/root         76026616 52881000  23129232      70% /
";
        let df = parse_df(output).unwrap();
        assert_eq!(df.filesystem, "/dev/root");
        assert_eq!(df.total_kb, 76026616);
        assert_eq!(df.used_kb, 52881000);
        assert_eq!(df.available_kb, 23129232);
        assert_eq!(df.capacity_percent, Some(70));
        assert_eq!(df.mount_point, "/");

        assert!(parse_df("Filesystem 1024-blocks\n").is_err());
        assert!(parse_df("h\noverlay x 1 2 3% /\n").is_err());
    }

    #[test]
    fn test_parse_lsblk() {
        let output = "\
sda    500107862016 disk    1
nvme0n1 1024209543168 disk  0
loop0       67108864 loop   0
";
        let devices = parse_lsblk(output).unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].name, "sda");
        assert_eq!(devices[0].size_bytes, 500107862016);
        assert!(devices[0].rotational);
        assert!(devices[1].is_disk());
        assert!(!devices[1].rotational);
        assert!(!devices[2].is_disk());

        assert!(parse_lsblk("sda big disk 1\n").is_err());
        assert!(parse_lsblk("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ip_addr() {
        let output = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever
1: lo    inet6 ::1/128 scope host \\       valid_lft forever preferred_lft forever
2: eth0    inet 10.1.0.4/16 brd 10.1.255.255 scope global eth0\\       valid_lft forever preferred_lft forever
2: eth0    inet6 fe80::20d:3aff:fe5c:1/64 scope link \\       valid_lft forever preferred_lft forever
";
        let addrs = parse_ip_addr(output).unwrap();
        assert_eq!(addrs.len(), 4);
        assert_eq!(addrs[2].interface, "eth0");
        assert_eq!(addrs[2].family, AddrFamily::V4);
        assert_eq!(addrs[2].address, "10.1.0.4");
        assert_eq!(addrs[3].family, AddrFamily::V6);
        assert_eq!(addrs[3].address, "fe80::20d:3aff:fe5c:1");

        assert!(parse_ip_addr("").unwrap().is_empty());
        assert!(parse_ip_addr("garbage line here\n").is_err());
    }

    #[test]
    fn test_parse_hostname_ips() {
        let (v4, v6) = parse_hostname_ips("10.1.0.4 172.17.0.1 fd00::4 \n");
        assert_eq!(v4, ["10.1.0.4", "172.17.0.1"]);
        assert_eq!(v6, ["fd00::4"]);
    }

    #[test]
    fn test_parse_uname() {
        let uname = parse_uname("Linux runner-7 6.5.0-1025-azure x86_64\n").unwrap();
        assert_eq!(uname.kernel_name, "Linux");
        assert_eq!(uname.hostname, "runner-7");
        assert_eq!(uname.kernel_release, "6.5.0-1025-azure");
        assert_eq!(uname.machine, "x86_64");

        assert!(parse_uname("Linux\n").is_err());
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_number("1001\n").unwrap(), 1001);
        assert!(parse_number("root").is_err());
        assert_eq!(
            parse_single_value("# SMBIOS entry point at 0x000f0000\nStandard PC (Q35)\n").unwrap(),
            "Standard PC (Q35)"
        );
        assert!(parse_single_value("\n").is_err());
    }
}
