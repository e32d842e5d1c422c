/// Ordinal suffix: 1st, 2nd, 3rd, 11th, 21st...
pub fn ordinal(n: i64) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", n, suffix)
}

/// Fixed-width progress bar used in the rank card
pub fn progress_bar(current: i64, total: i64, width: usize) -> String {
    let filled = if total <= 0 {
        width
    } else {
        ((current.max(0) as f64 / total as f64) * width as f64).round() as usize
    }
    .min(width);

    format!("{}{}", "▰".repeat(filled), "▱".repeat(width - filled))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(103), "103rd");
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0, 100, 10), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(50, 100, 10), "▰▰▰▰▰▱▱▱▱▱");
        assert_eq!(progress_bar(200, 100, 10), "▰▰▰▰▰▰▰▰▰▰");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }
}
