//! Parsers for cgroup v2 files.

use crate::collector::procfs::ParseError;

/// Parses memory.max file.
/// Format: number (bytes) or "max"
///
/// Returns `None` for an unlimited cgroup.
pub fn parse_memory_max(content: &str) -> Result<Option<u64>, ParseError> {
    let trimmed = content.trim();
    if trimmed == "max" {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| ParseError::new(format!("invalid memory.max value '{trimmed}'")))
}

/// Parses memory.current file.
/// Format: number (bytes)
pub fn parse_memory_current(content: &str) -> Result<u64, ParseError> {
    let trimmed = content.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::new(format!("invalid memory.current value '{trimmed}'")))
}

/// Extracts the unified hierarchy path from `/proc/self/cgroup`.
/// Format: "0::/path" (v2), possibly mixed with v1 "N:controller:/path" lines
pub fn parse_unified_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.strip_prefix("0::")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_max() {
        assert_eq!(parse_memory_max("1073741824\n").unwrap(), Some(1073741824));
        assert_eq!(parse_memory_max("max\n").unwrap(), None);
        assert!(parse_memory_max("lots\n").is_err());
    }

    #[test]
    fn test_parse_memory_current() {
        assert_eq!(parse_memory_current("536870912\n").unwrap(), 536870912);
        assert!(parse_memory_current("").is_err());
    }

    #[test]
    fn test_parse_unified_path() {
        assert_eq!(
            parse_unified_path("0::/system.slice/docker-abc.scope\n").as_deref(),
            Some("/system.slice/docker-abc.scope")
        );
        assert_eq!(
            parse_unified_path("12:memory:/docker/abc\n0::/\n").as_deref(),
            Some("/")
        );
        assert_eq!(parse_unified_path("12:memory:/docker/abc\n"), None);
    }
}
