//! Timestamp normalization.
//!
//! Stored and client-supplied documents carry instants in several shapes:
//! RFC 3339 strings, epoch milliseconds, `{seconds, nanoseconds}` and
//! `{_seconds, _nanoseconds}` objects. [`normalize`] folds all of them into a
//! `DateTime<Utc>`; the serde adapters apply it on deserialization so the rest
//! of the system only ever sees the canonical type.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::error::SharedError;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Convert any supported timestamp shape into a UTC instant.
pub fn normalize(value: &Value) -> Result<DateTime<Utc>, SharedError> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => n.as_f64().ok_or(SharedError::TimestampRange)?.floor() as i64,
            };
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or(SharedError::TimestampRange)
        }
        Value::Object(map) => {
            let (secs, nanos) = if let Some(secs) = map.get("seconds") {
                (secs, map.get("nanoseconds"))
            } else if let Some(secs) = map.get("_seconds") {
                (secs, map.get("_nanoseconds"))
            } else {
                return Err(SharedError::TimestampShape(value.to_string()));
            };
            let secs = secs
                .as_i64()
                .ok_or_else(|| SharedError::TimestampShape(value.to_string()))?;
            let nanos = nanos.and_then(Value::as_u64).unwrap_or(0);
            let nanos = u32::try_from(nanos).map_err(|_| SharedError::TimestampRange)?;
            Utc.timestamp_opt(secs, nanos)
                .single()
                .ok_or(SharedError::TimestampRange)
        }
        other => Err(SharedError::TimestampShape(other.to_string())),
    }
}

fn parse_str(s: &str) -> Result<DateTime<Utc>, SharedError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ms) = s.parse::<i64>() {
        return normalize(&Value::from(ms));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(naive.and_utc())
}

/// Canonical wire form, keeping sub-second precision.
pub fn to_wire(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Human-readable form, e.g. `"5 March 2025, 14:07"`.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    use chrono::{Datelike, Timelike};
    format!(
        "{} {} {}, {:02}:{:02}",
        dt.day(),
        MONTHS[dt.month0() as usize],
        dt.year(),
        dt.hour(),
        dt.minute()
    )
}

/// Display form of an optional instant; a missing one reads `Not available`.
pub fn format_display(dt: Option<&DateTime<Utc>>) -> String {
    match dt {
        Some(dt) => format_instant(dt),
        None => "Not available".to_string(),
    }
}

/// `#[serde(with = "flexible")]` for `DateTime<Utc>` fields.
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_wire(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(d)?;
        super::normalize(&value).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "flexible_option")]` for `Option<DateTime<Utc>>` fields.
pub mod flexible_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_str(&super::to_wire(dt)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            value => super::normalize(&value).map(Some).map_err(de::Error::custom),
        }
    }
}
