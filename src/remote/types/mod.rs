//! Serializable records produced by the output parsers.
//!
//! All types implement `Serialize`, `Deserialize`, and `JsonSchema` so the
//! HTTP layer can return them directly and publish their schemas.

mod docker;
mod filesystem;
mod system;

use chrono::{DateTime, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use docker::*;
pub use filesystem::*;
pub use system::*;

/// A point in time reported by a remote command.
///
/// Serializes as an RFC3339 string when the source value parsed, otherwise
/// as the raw token the command printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl Timestamp {
    /// Parse an RFC3339 value, keeping the raw text when it does not parse.
    ///
    /// Returns `None` for empty input.
    pub fn from_rfc3339(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Timestamp::Parsed(parsed.with_timezone(&Utc)),
            Err(_) => Timestamp::Raw(raw.to_string()),
        })
    }

    /// Build from a Unix epoch in seconds, keeping the raw text when it does not parse.
    pub fn from_epoch(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            match raw
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            {
                Some(parsed) => Timestamp::Parsed(parsed),
                None => Timestamp::Raw(raw.to_string()),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_with_nanos() {
        let ts = Timestamp::from_rfc3339("2024-03-01T10:20:30.123456789Z").unwrap();
        let Timestamp::Parsed(at) = ts else {
            panic!("expected a parsed timestamp, got {ts:?}");
        };
        assert_eq!(at.to_rfc3339(), "2024-03-01T10:20:30.123456789+00:00");
    }

    #[test]
    fn test_unparseable_kept_raw() {
        let ts = Timestamp::from_rfc3339("2 days ago").unwrap();
        assert_eq!(ts, Timestamp::Raw("2 days ago".to_string()));
        assert_eq!(serde_json::to_value(&ts).unwrap(), serde_json::json!("2 days ago"));
    }

    #[test]
    fn test_empty_is_none() {
        assert!(Timestamp::from_rfc3339("  ").is_none());
        assert!(Timestamp::from_epoch("").is_none());
    }

    #[test]
    fn test_epoch() {
        let ts = Timestamp::from_epoch("1700000000").unwrap();
        assert_eq!(
            serde_json::to_value(&ts).unwrap(),
            serde_json::json!("2023-11-14T22:13:20Z")
        );
        assert_eq!(
            Timestamp::from_epoch("soon").unwrap(),
            Timestamp::Raw("soon".to_string())
        );
    }
}
