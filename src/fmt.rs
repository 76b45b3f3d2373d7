//! Formatting helpers for the human-readable report.
//!
//! Pure functions only; the report module decides which fields use them.

/// Format byte count as human-readable size: `"1.5 GiB"`, `"100.3 MiB"`, `"512 B"`.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    const TIB: u64 = GIB * 1024;

    let f = bytes as f64;
    if bytes >= TIB {
        format!("{:.1} TiB", f / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1} GiB", f / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", f / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", f / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in seconds: `"3m 5s"`, `"2h 10m"`, `"4d 1h"`.
pub fn format_duration(secs: i64) -> String {
    if secs <= 0 {
        return "0s".to_string();
    }
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format a percentage with two decimals: `"26.76%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Truncate string to max length with unicode ellipsis (`…`).
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(100 * 1024 * 1024 + 300 * 1024), "100.3 MiB");
        assert_eq!(format_bytes(16_777_216_000), "15.6 GiB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024 * 1024), "2.0 TiB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(-5), "0s");
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(185), "3m 5s");
        assert_eq!(format_duration(7800), "2h 10m");
        assert_eq!(format_duration(4 * 86400 + 3600 + 59), "4d 1h");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(26.76), "26.76%");
        assert_eq!(format_percent(5.0), "5.00%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Intel(R) Xeon(R)", 8), "Intel(R…");
    }
}
