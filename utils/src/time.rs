//! Time formatting helpers.

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
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

/// Seconds until the next epoch boundary, formatted for logs.
pub fn format_countdown(now_secs: u64, due_secs: u64) -> String {
    if due_secs <= now_secs {
        "due now".to_string()
    } else {
        format!("in {}", format_duration(due_secs - now_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_unit() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(7 * 86_400 + 3_600), "7d 1h");
    }

    #[test]
    fn countdown_saturates() {
        assert_eq!(format_countdown(10, 10), "due now");
        assert_eq!(format_countdown(10, 5), "due now");
        assert_eq!(format_countdown(0, 90), "in 1m 30s");
    }
}
