//! SQLite helper utilities for type conversion
//!
//! SQLite has no native UUID, array or timestamp types. Ids are stored as
//! hyphenated UUID strings, URL lists as JSON text and timestamps as RFC 3339
//! text with a fixed precision so that string order matches time order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

// ============================================================================
// Id Helpers
// ============================================================================

/// Generate a new record id
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Array/Vec Helpers (stored as JSON strings in SQLite)
// ============================================================================

/// Serialize a Vec to a JSON string for SQLite storage
#[inline]
pub fn vec_to_json<T: Serialize>(v: &[T]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a JSON string from SQLite to a Vec
#[inline]
pub fn json_to_vec<T: DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Current UTC timestamp as a sortable ISO8601 string
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

/// Convert a chrono DateTime to a sortable ISO8601 string
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.123456Z")
            .unwrap()
            .with_timezone(&Utc)
            + chrono::Duration::seconds(1);

        let a = datetime_to_str(earlier);
        let b = datetime_to_str(later);
        assert_eq!(a, "2024-05-01T10:00:00.500000Z");
        assert!(a < b);
    }

    #[test]
    fn test_url_lists_survive_storage() {
        let urls = vec!["https://cdn/a.png".to_string(), "https://cdn/b.png".to_string()];
        let stored = vec_to_json(&urls);
        assert_eq!(json_to_vec::<String>(&stored), urls);
        assert!(json_to_vec::<String>("not json").is_empty());
    }
}
