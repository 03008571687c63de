use chrono::{DateTime, TimeZone, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a stored millisecond timestamp back into a `DateTime`
///
/// Out-of-range values clamp to the Unix epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// New resource identifier (hyphenated UUID v4)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_roundtrip() {
        let now = now_millis();
        assert_eq!(millis_to_datetime(now).timestamp_millis(), now);
    }

    #[test]
    fn test_new_id_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 36);
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short", 50), "short");
        let long = "a".repeat(60);
        assert_eq!(snippet(&long, 50), format!("{}...", "a".repeat(50)));
        assert_eq!(snippet(&"b".repeat(50), 50), "b".repeat(50));
        // multi-byte characters are counted, not bytes
        assert_eq!(snippet("ñandú", 3), "ñan...");
    }
}
