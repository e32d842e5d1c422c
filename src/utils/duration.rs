use crate::bot::error::Error;

const UNITS: &[(&str, i64)] = &[
    ("week", 60 * 60 * 24 * 7),
    ("day", 60 * 60 * 24),
    ("hour", 60 * 60),
    ("minute", 60),
    ("second", 1),
];

/// Parse a user-supplied duration like `45m`, `2h` or `7d` into seconds.
pub fn parse_duration(input: &str) -> Result<i64, Error> {
    let input = input.trim();
    let invalid = || Error::InvalidDuration(input.to_string());

    let (value, unit) = input.split_at(input.len().saturating_sub(1));
    let amount: i64 = value.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let seconds = match unit.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 60 * 60 * 24,
        Some('w') => 60 * 60 * 24 * 7,
        _ => return Err(invalid()),
    };

    Ok(amount * seconds)
}

/// Format a duration in seconds as `1 week, 2 days and 3 hours`.
/// Returns "Indefinite" for zero or negative values.
pub fn humanize(seconds: i64) -> String {
    if seconds <= 0 {
        return "Indefinite".to_string();
    }

    let mut remaining = seconds;
    let mut parts = Vec::new();
    for (unit, div) in UNITS {
        let amount = remaining / div;
        remaining %= div;
        if amount > 0 {
            parts.push(format!("{} {}{}", amount, unit, if amount == 1 { "" } else { "s" }));
        }
    }

    match parts.len() {
        0 => "Indefinite".to_string(),
        1 => parts.remove(0),
        n => format!("{} and {}", parts[..n - 1].join(", "), parts[n - 1]),
    }
}

/// Duration text for an optional expiry, e.g. moderation log embeds.
pub fn humanize_opt(duration: Option<i64>) -> String {
    duration.map(humanize).unwrap_or_else(|| "Indefinite".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("30s").unwrap(), 30);
        assert_eq!(parse_duration("45m").unwrap(), 2700);
        assert_eq!(parse_duration("2h").unwrap(), 7200);
        assert_eq!(parse_duration("7D").unwrap(), 604_800);
        assert_eq!(parse_duration("1w").unwrap(), 604_800);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "h", "10", "-5m", "0h", "soon", "1.5h"] {
            assert!(matches!(parse_duration(bad), Err(Error::InvalidDuration(_))), "{}", bad);
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(3600), "1 hour");
        assert_eq!(humanize(3661), "1 hour, 1 minute and 1 second");
        assert_eq!(humanize(172_800), "2 days");
        assert_eq!(humanize_opt(None), "Indefinite");
        assert_eq!(humanize_opt(Some(60)), "1 minute");
    }
}
