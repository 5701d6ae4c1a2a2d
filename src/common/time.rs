//! Timestamp handling shared by the cleaner, the feature engineer and storage.
//!
//! All instants are anchored to UTC. Collectors emit RFC 3339 (`2014-06-06T00:00:00Z`),
//! but tables that went through other tools tend to come back as
//! `2014-06-06 00:00:00+00:00`, so both spellings and a few naive variants are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp cell into a UTC instant.
///
/// Naive values (no offset) are taken as UTC. The error is a human-readable reason.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("empty value".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err("unrecognized timestamp format".to_string())
}

/// Canonical on-disk spelling: RFC 3339 with a `Z` suffix
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Whole days elapsed from `earlier` to `later`, floored.
///
/// Negative when `earlier` is after `later`.
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Serde adapter for timestamp columns in CSV tables
pub mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .map_err(|reason| de::Error::custom(format!("invalid timestamp '{raw}': {reason}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn parses_github_style_timestamps() {
        assert_eq!(
            parse_timestamp("2014-06-06T00:00:00Z").unwrap(),
            utc(2014, 6, 6, 0, 0, 0)
        );
    }

    #[test]
    fn parses_offset_and_naive_variants() {
        let expected = utc(2020, 1, 1, 12, 30, 0);
        assert_eq!(parse_timestamp("2020-01-01 12:30:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2020-01-01T14:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2020-01-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp(" 2020-01-01T12:30:00 ").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2020-01-01").unwrap(),
            utc(2020, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage_and_empty_cells() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2020-13-45T00:00:00Z").is_err());
    }

    #[test]
    fn formats_with_z_suffix() {
        assert_eq!(format_timestamp(&utc(2024, 1, 1, 0, 0, 0)), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn whole_days_floor_partial_days() {
        let start = utc(2024, 1, 1, 0, 0, 0);
        assert_eq!(whole_days_between(start, start), 0);
        assert_eq!(whole_days_between(start, utc(2024, 1, 1, 23, 59, 59)), 0);
        assert_eq!(whole_days_between(start, utc(2024, 1, 3, 1, 0, 0)), 2);
        assert_eq!(whole_days_between(utc(2024, 1, 1, 12, 0, 0), start), -1);
    }
}
