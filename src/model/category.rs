//! Fact categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical domain of host facts.
///
/// The set is fixed; declaration order is the order categories appear in
/// snapshots and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SystemIdentity,
    CpuInfo,
    MemoryInfo,
    DiskInfo,
    NetworkInfo,
    SecurityPosture,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 6] = [
        Category::SystemIdentity,
        Category::CpuInfo,
        Category::MemoryInfo,
        Category::DiskInfo,
        Category::NetworkInfo,
        Category::SecurityPosture,
    ];

    /// Stable artifact name (`memory_info`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Category::SystemIdentity => "system_identity",
            Category::CpuInfo => "cpu_info",
            Category::MemoryInfo => "memory_info",
            Category::DiskInfo => "disk_info",
            Category::NetworkInfo => "network_info",
            Category::SecurityPosture => "security_posture",
        }
    }

    /// Section title used in the human report.
    pub fn title(self) -> &'static str {
        match self {
            Category::SystemIdentity => "System",
            Category::CpuInfo => "CPU",
            Category::MemoryInfo => "Memory",
            Category::DiskInfo => "Disk",
            Category::NetworkInfo => "Network",
            Category::SecurityPosture => "Security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the artifact name or a short alias (`cpu`, `memory`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "system_identity" | "system" | "identity" => Ok(Category::SystemIdentity),
            "cpu_info" | "cpu" => Ok(Category::CpuInfo),
            "memory_info" | "memory" | "mem" => Ok(Category::MemoryInfo),
            "disk_info" | "disk" => Ok(Category::DiskInfo),
            "network_info" | "network" | "net" => Ok(Category::NetworkInfo),
            "security_posture" | "security" => Ok(Category::SecurityPosture),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("cpu".parse::<Category>().unwrap(), Category::CpuInfo);
        assert_eq!(
            "Memory-Info".parse::<Category>().unwrap(),
            Category::MemoryInfo
        );
        assert_eq!(
            "security_posture".parse::<Category>().unwrap(),
            Category::SecurityPosture
        );
        assert!("gpu".parse::<Category>().is_err());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }
}
