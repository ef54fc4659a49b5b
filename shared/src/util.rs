use chrono::{DateTime, NaiveDate, NaiveTime};

/// Parse a calendar date sent by clients.
///
/// Accepts `YYYY-MM-DD` as well as a full RFC 3339 timestamp, whose date
/// part is used.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Parse an `HH:MM` time of day
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Free-text search input turned into a bound `LIKE` pattern.
///
/// Returns `None` for blank input so callers can skip the filter. The
/// wildcard characters `%`, `_` and the escape character `\` are escaped so a
/// user's input only ever matches literally.
pub fn search_pattern(raw: Option<&str>) -> Option<String> {
    let term = raw.map(str::trim).filter(|t| !t.is_empty())?;
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// Case-insensitive match of a `search_pattern` against plain text, used by
/// in-process filtering.
pub fn matches_pattern(pattern: &str, text: &str) -> bool {
    let needle = pattern
        .trim_matches('%')
        .replace("\\%", "%")
        .replace("\\_", "_")
        .replace("\\\\", "\\")
        .to_lowercase();
    text.to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 27);
        assert_eq!(parse_date("2025-01-27"), expected);
        assert_eq!(parse_date("2025-01-27T00:00:00Z"), expected);
        assert_eq!(parse_date("2025-01-27T09:30:00+05:30"), expected);
        assert_eq!(parse_date("27-01-2025"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_time_of_day("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_time_of_day("24:00"), None);
        assert_eq!(parse_time_of_day("9am"), None);
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" eng ")).as_deref(), Some("%eng%"));
        assert_eq!(search_pattern(Some("50%_a")).as_deref(), Some("%50\\%\\_a%"));
        // quotes and statement separators are plain data once bound
        assert_eq!(
            search_pattern(Some("O'Brien; --")).as_deref(),
            Some("%O'Brien; --%")
        );
    }

    #[test]
    fn test_matches_pattern() {
        let pattern = search_pattern(Some("eng")).unwrap();
        assert!(matches_pattern(&pattern, "Engineering"));
        assert!(!matches_pattern(&pattern, "Sales"));
        let pattern = search_pattern(Some("50%")).unwrap();
        assert!(matches_pattern(&pattern, "top 50% club"));
    }
}
