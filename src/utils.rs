/// Parses a duration of the form ``30m``, ``2h`` or ``7d`` into a
/// `chrono::Duration`. Supported units are s/m/h/d/w.
pub fn parse_duration(raw: &str) -> Result<chrono::Duration, crate::Error> {
    let raw = raw.trim();

    if raw.len() < 2 || !raw.is_char_boundary(raw.len() - 1) {
        return Err(format!("Invalid duration: {} (expected e.g. 30m, 2h, 7d)", raw).into());
    }

    let (amount, unit) = raw.split_at(raw.len() - 1);

    let amount = amount
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("Invalid duration amount: {}", raw))?;

    if amount <= 0 {
        return Err(format!("Duration must be positive: {}", raw).into());
    }

    let duration = match unit {
        "s" => chrono::Duration::try_seconds(amount),
        "m" => chrono::Duration::try_minutes(amount),
        "h" => chrono::Duration::try_hours(amount),
        "d" => chrono::Duration::try_days(amount),
        "w" => chrono::Duration::try_weeks(amount),
        _ => return Err(format!("Invalid duration unit (use s/m/h/d/w): {}", raw).into()),
    };

    duration.ok_or_else(|| format!("Duration is too large: {}", raw).into())
}

#[cfg(test)]
mod tests {
    use super::parse_duration;

    #[test]
    fn accepts_common_suffixes() {
        assert_eq!(parse_duration("30m").unwrap(), chrono::Duration::minutes(30));
        assert_eq!(parse_duration("2h").unwrap(), chrono::Duration::hours(2));
        assert_eq!(parse_duration("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_duration("1w").unwrap(), chrono::Duration::weeks(1));
        assert_eq!(parse_duration(" 45s ").unwrap(), chrono::Duration::seconds(45));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("12").is_err());
        assert!(parse_duration("-5m").is_err());
        assert!(parse_duration("0h").is_err());
        assert!(parse_duration("5y").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
