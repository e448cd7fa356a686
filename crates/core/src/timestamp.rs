//! Lenient (de)serialization of optional UTC timestamps.
//!
//! Writes RFC 3339 in UTC. Reads RFC 3339 with any offset, naive ISO-8601
//! (taken as UTC) and treats blank strings, `null`, and the `0001-01-01`
//! zero value as unset.

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(raw) => parse(&raw).map_err(de::Error::custom),
        None => Ok(None),
    }
}

fn parse(raw: &str) -> Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let ts = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))?
            .and_utc(),
    };

    if ts.year() <= 1 { Ok(None) } else { Ok(Some(ts)) }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, with = "super")]
        at: Option<chrono::DateTime<chrono::Utc>>,
    }

    fn read(json: &str) -> Holder {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_rfc3339_with_offset() {
        let h = read(r#"{"at":"2024-03-01T12:00:00+02:00"}"#);
        assert_eq!(h.at, Some(chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let h = read(r#"{"at":"2024-03-01T12:00:00.1234567"}"#);
        let at = h.at.unwrap();
        assert_eq!(at.date_naive(), chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn zero_blank_null_and_missing_are_unset() {
        assert_eq!(read(r#"{"at":"0001-01-01T00:00:00"}"#).at, None);
        assert_eq!(read(r#"{"at":"0001-01-01T00:00:00Z"}"#).at, None);
        assert_eq!(read(r#"{"at":""}"#).at, None);
        assert_eq!(read(r#"{"at":null}"#).at, None);
        assert_eq!(read(r#"{}"#).at, None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Holder>(r#"{"at":"yesterday"}"#).is_err());
    }

    #[test]
    fn writes_utc_rfc3339() {
        let h = Holder {
            at: Some(chrono::Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()),
        };
        assert_eq!(
            serde_json::to_string(&h).unwrap(),
            r#"{"at":"2025-01-02T03:04:05.000Z"}"#
        );
    }
}
