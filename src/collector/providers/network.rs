//! NetworkInfo providers. The loopback interface is never reported.

use async_trait::async_trait;

use super::put;
use crate::collector::host::HostContext;
use crate::collector::procfs::parser::parse_net_dev;
use crate::collector::provider::{Platform, ProviderError, SourceProvider};
use crate::collector::tools::parser::{AddrFamily, parse_hostname_ips, parse_ip_addr};
use crate::model::{Category, Fields};

const LOOPBACK: &str = "lo";

/// Interface lists are sorted so that sources agree regardless of listing order.
fn put_interfaces(fields: &mut Fields, mut interfaces: Vec<String>) {
    interfaces.sort();
    put(fields, "interface_count", interfaces.len());
    put(fields, "interfaces", interfaces);
}

/// `/proc/net/dev`.
pub struct ProcfsNetdev;

#[async_trait]
impl SourceProvider for ProcfsNetdev {
    fn name(&self) -> &str {
        "procfs-netdev"
    }
    fn category(&self) -> Category {
        Category::NetworkInfo
    }
    fn priority(&self) -> u32 {
        10
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let devices: Vec<_> = parse_net_dev(&host.read(&host.proc("net/dev"))?)?
            .into_iter()
            .filter(|d| d.interface != LOOPBACK)
            .collect();

        let mut fields = Fields::new();
        put(
            &mut fields,
            "rx_bytes",
            devices.iter().fold(0u64, |acc, d| acc.saturating_add(d.rx_bytes)),
        );
        put(
            &mut fields,
            "tx_bytes",
            devices.iter().fold(0u64, |acc, d| acc.saturating_add(d.tx_bytes)),
        );
        put_interfaces(
            &mut fields,
            devices.into_iter().map(|d| d.interface).collect(),
        );
        Ok(fields)
    }
}

/// `ip -o addr show`. Link-local IPv6 addresses are skipped.
pub struct IpAddr;

#[async_trait]
impl SourceProvider for IpAddr {
    fn name(&self) -> &str {
        "ip-addr"
    }
    fn category(&self) -> Category {
        Category::NetworkInfo
    }
    fn priority(&self) -> u32 {
        20
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let addrs = parse_ip_addr(&host.run("ip", &["-o", "addr", "show"]).await?)?;

        let mut interfaces: Vec<String> = Vec::new();
        let mut ipv4 = Vec::new();
        let mut ipv6 = Vec::new();
        for addr in addrs.into_iter().filter(|a| a.interface != LOOPBACK) {
            if !interfaces.contains(&addr.interface) {
                interfaces.push(addr.interface.clone());
            }
            match addr.family {
                AddrFamily::V4 => ipv4.push(addr.address),
                AddrFamily::V6 if addr.address.starts_with("fe80:") => {}
                AddrFamily::V6 => ipv6.push(addr.address),
            }
        }

        let mut fields = Fields::new();
        put_interfaces(&mut fields, interfaces);
        put(&mut fields, "ipv4_addresses", ipv4);
        put(&mut fields, "ipv6_addresses", ipv6);
        Ok(fields)
    }
}

/// `hostname -I`. Not supported by BSD or BusyBox `hostname`.
pub struct HostnameIps;

#[async_trait]
impl SourceProvider for HostnameIps {
    fn name(&self) -> &str {
        "hostname-ips"
    }
    fn category(&self) -> Category {
        Category::NetworkInfo
    }
    fn priority(&self) -> u32 {
        30
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let (ipv4, ipv6) = parse_hostname_ips(&host.run("hostname", &["-I"]).await?);

        let mut fields = Fields::new();
        put(&mut fields, "ipv4_addresses", ipv4);
        put(&mut fields, "ipv6_addresses", ipv6);
        Ok(fields)
    }
}

/// Interface names from `/sys/class/net`.
pub struct SysfsNet;

#[async_trait]
impl SourceProvider for SysfsNet {
    fn name(&self) -> &str {
        "sysfs-net"
    }
    fn category(&self) -> Category {
        Category::NetworkInfo
    }
    fn priority(&self) -> u32 {
        40
    }
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    async fn fetch(&self, host: &HostContext) -> Result<Fields, ProviderError> {
        let dir = host.sys("class/net");
        let entries = host
            .fs()
            .read_dir(&dir)
            .map_err(|source| ProviderError::Io { path: dir, source })?;

        let interfaces: Vec<String> = entries
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| n != LOOPBACK)
            .collect();

        let mut fields = Fields::new();
        put_interfaces(&mut fields, interfaces);
        Ok(fields)
    }
}
