//! Small helpers shared by config loading, the local cache and the models.

/// Trim an optional setting or preference and treat blank as unset.
///
/// `SCOUT_*` variables, the cached event key and the saved scout name all go
/// through this, so `"  "` never ends up as a real value.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Whether an API base URL names a scheme `reqwest` can talk to.
pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Cap a backend error body at 180 characters before it lands in a rejection reason.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Entry and pit timestamps, in Unix milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Round to one decimal place, the precision used for displayed statistics.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn blank_preferences_are_unset() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" 2026cahal\n".to_string())),
            Some("2026cahal".to_string())
        );
    }

    #[test]
    fn api_url_needs_http_scheme() {
        assert!(is_http_url("http://127.0.0.1:3001"));
        assert!(is_http_url("https://scout.example.org/api"));
        assert!(!is_http_url("ws://scout.example.org"));
        assert!(!is_http_url("scout.example.org"));
    }

    #[test]
    fn error_bodies_are_capped() {
        let body = format!("  {}  ", "x".repeat(400));
        assert_eq!(compact_text(&body).len(), 180);
        assert_eq!(compact_text(" Entry limit reached "), "Entry limit reached");
    }

    #[test]
    fn round_tenth_keeps_one_decimal() {
        assert!((round_tenth(2.345) - 2.3).abs() < 1e-9);
        assert!((round_tenth(8.16) - 8.2).abs() < 1e-9);
    }
}
