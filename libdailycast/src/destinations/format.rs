//! Body transforms shared by destinations

/// Marker appended to bodies that had to be shortened
pub const ELLIPSIS: &str = "...";

/// Limit `body` to `limit` characters, ending truncated bodies with `marker`
///
/// Lengths are counted in Unicode scalar values. A body already within the
/// limit is returned unchanged, so applying this to its own output is a
/// no-op. A truncated result never exceeds `limit`, marker included.
pub fn truncate_with_marker(body: &str, limit: usize, marker: &str) -> String {
    if body.chars().count() <= limit {
        return body.to_string();
    }

    let marker_len = marker.chars().count();
    if marker_len >= limit {
        return body.chars().take(limit).collect();
    }

    let kept: String = body.chars().take(limit - marker_len).collect();
    let mut truncated = kept.trim_end().to_string();
    truncated.push_str(marker);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_is_unchanged() {
        assert_eq!(truncate_with_marker("hello", 280, ELLIPSIS), "hello");
    }

    #[test]
    fn test_body_at_limit_is_unchanged() {
        let body = "a".repeat(280);
        assert_eq!(truncate_with_marker(&body, 280, ELLIPSIS), body);
    }

    #[test]
    fn test_long_body_is_cut_to_limit_with_marker() {
        let body = "a".repeat(300);
        let truncated = truncate_with_marker(&body, 280, ELLIPSIS);
        assert_eq!(truncated.chars().count(), 280);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..277], &body[..277]);
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let body = "word ".repeat(100);
        let once = truncate_with_marker(&body, 280, ELLIPSIS);
        let twice = truncate_with_marker(&once, 280, ELLIPSIS);
        assert_eq!(once, twice);
        assert_eq!(twice.matches("...").count(), 1);
    }

    #[test]
    fn test_trailing_whitespace_before_marker_is_dropped() {
        let truncated = truncate_with_marker("Hello world and more", 9, ELLIPSIS);
        assert_eq!(truncated, "Hello...");
    }

    #[test]
    fn test_multibyte_characters_are_counted_not_bytes() {
        let body = "é".repeat(12);
        let truncated = truncate_with_marker(&body, 10, ELLIPSIS);
        assert_eq!(truncated.chars().count(), 10);
        assert_eq!(truncated, format!("{}...", "é".repeat(7)));

        let emoji = "🚀".repeat(5);
        assert_eq!(truncate_with_marker(&emoji, 5, ELLIPSIS), emoji);
    }

    #[test]
    fn test_marker_longer_than_limit_hard_cuts() {
        assert_eq!(truncate_with_marker("abcdef", 2, ELLIPSIS), "ab");
    }
}
