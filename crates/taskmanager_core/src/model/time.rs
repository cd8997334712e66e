//! Timestamp text codec.
//!
//! Timestamps are zone-less local date-times persisted as ISO-8601 text
//! (`2024-05-01T09:30:00`, optional fraction). Fixed-width formatting keeps
//! lexical order equal to chronological order, which `ORDER BY dueDate`
//! relies on.

use chrono::{Local, NaiveDateTime};

const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const READ_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Formats a timestamp for storage.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(WRITE_FORMAT).to_string()
}

/// Parses stored timestamp text. Accepts values with seconds omitted.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    READ_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Current local wall-clock time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Serde adapter for optional timestamps in JSON documents.
///
/// Writes the storage text form and reads everything `parse_timestamp`
/// accepts, including values without seconds.
pub mod optional_text {
    use super::{format_timestamp, parse_timestamp};
    use chrono::NaiveDateTime;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format_timestamp(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                parse_timestamp(&text)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{text}`")))
            })
            .transpose()
    }
}
