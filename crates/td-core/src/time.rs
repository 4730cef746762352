//! Timestamp normalization
//!
//! Clients send datetimes in three shapes: RFC 3339 with an offset, a naive
//! ISO datetime without one, and bare `YYYY-MM-DD` dates. Everything is
//! normalized to `DateTime<Utc>` at the edge; naive values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Current UTC time, truncated to whole microseconds so values survive a
/// round-trip through the record store's JSON rows unchanged.
pub fn now() -> DateTime<Utc> {
    let ts = Utc::now();
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// Parse a client-supplied timestamp into UTC.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, `2024-05-01T10:00:00+02:00`),
/// a naive ISO datetime (`2024-05-01T10:00:00`, with optional fraction),
/// and a bare date (`2024-05-01`, read as midnight UTC).
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}

/// Serde adapters for timestamp fields that must accept all client shapes.
pub mod flexible {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        normalize_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw:?}")))
    }

    /// Variant for `Option<DateTime<Utc>>` fields.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            ser: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => ser.serialize_some(&v.to_rfc3339()),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            de: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(de)?;
            match raw {
                None => Ok(None),
                Some(raw) => normalize_timestamp(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("unrecognized timestamp: {raw:?}"))
                }),
            }
        }
    }
}
