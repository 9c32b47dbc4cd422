//! Shared helper functions for CLI commands

use chrono::{DateTime, Local, Utc};

/// Truncate a string to max_len, adding "..." if truncated
///
/// Cuts between characters, so names with multi-byte letters never
/// split mid-character.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    match s.char_indices().nth(max_len.saturating_sub(3)) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

/// Shorten a store key for table display
///
/// UUID keys collapse to their first block; name keys pass through,
/// truncated only when unusually long.
pub fn short_key(key: &str) -> String {
    // Dash positions pin down the 8-4-4-4-12 layout, which also makes
    // the byte-8 slice below a guaranteed char boundary.
    let bytes = key.as_bytes();
    let looks_like_uuid = bytes.len() == 36 && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-');
    if looks_like_uuid {
        format!("{}...", &key[..8])
    } else {
        truncate_str(key, 24)
    }
}

/// Format a UTC timestamp in local time for table display
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
