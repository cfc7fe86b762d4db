use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

/// Moment at which a play happened.
///
/// Keeps the exact text it was parsed from so a store is written back without reformatting,
/// while ordering and equality are defined on the parsed instant.
#[derive(Debug, Clone)]
pub struct PlayedAt {
    raw: String,
    instant: DateTime<Utc>,
}

impl PlayedAt {
    /// Parses an RFC 3339 timestamp such as `2024-01-01T00:00:00.123Z`.
    ///
    /// Surrounding whitespace is dropped and not kept in the stored text.
    pub fn parse(raw: &str) -> Result<Self, chrono::ParseError> {
        let raw = raw.trim();
        let instant = DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc);

        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    /// Returns the original timestamp text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant in UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Returns `true` if `self` is strictly later than `watermark`.
    ///
    /// Plays at exactly the watermark are not newer.
    pub fn is_newer_than(&self, watermark: &PlayedAt) -> bool {
        self.instant > watermark.instant
    }
}

impl From<DateTime<Utc>> for PlayedAt {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
            instant,
        }
    }
}

impl PartialEq for PlayedAt {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for PlayedAt {}

impl PartialOrd for PlayedAt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlayedAt {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl fmt::Display for PlayedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
