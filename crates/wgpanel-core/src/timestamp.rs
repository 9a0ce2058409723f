//! Timestamp format used in the users file and API responses.
//!
//! Values are written as `YYYY-MM-DD HH:MM:SS` in UTC. RFC 3339 strings are
//! accepted on read.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `strftime` pattern for persisted timestamps.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `ts` in the persisted format.
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

/// Parse either the persisted format or RFC 3339.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(raw, FORMAT) {
        Ok(naive) => Ok(naive.and_utc()),
        Err(_) => DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)),
    }
}

/// `#[serde(with = "...")]` adapter for `Option<DateTime<Utc>>` fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as a formatted string or `null`.
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&super::format(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from a formatted string or `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
