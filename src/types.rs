use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::common::time;

/// One repository row exactly as the collector wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub repo_name: String,
    pub language: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(deserialize_with = "optional_count")]
    pub stargazers_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub forks_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub open_issues_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub watchers_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub size: Option<u64>,
}

/// A raw row tagged with the partition it was loaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub repo_name: String,
    pub language: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(deserialize_with = "optional_count")]
    pub stargazers_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub forks_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub open_issues_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub watchers_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub size: Option<u64>,
    pub language_source: String,
}

impl MergedRecord {
    pub fn from_raw(raw: RawRecord, language_source: &str) -> Self {
        Self {
            repo_name: raw.repo_name,
            language: raw.language,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            stargazers_count: raw.stargazers_count,
            forks_count: raw.forks_count,
            open_issues_count: raw.open_issues_count,
            watchers_count: raw.watchers_count,
            size: raw.size,
            language_source: language_source.to_string(),
        }
    }
}

/// A validated, deduplicated and bounded repository row.
///
/// `repo_age_days` and `stars_per_day` are always set by the cleaner; they are
/// optional only so that cleaned tables produced elsewhere can still be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub repo_name: String,
    pub language: String,
    #[serde(with = "time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "time::rfc3339")]
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "required_count")]
    pub stargazers_count: u64,
    #[serde(deserialize_with = "required_count")]
    pub forks_count: u64,
    #[serde(deserialize_with = "optional_count")]
    pub open_issues_count: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub watchers_count: Option<u64>,
    #[serde(deserialize_with = "required_count")]
    pub size: u64,
    pub language_source: String,
    #[serde(default)]
    pub repo_age_days: Option<i64>,
    #[serde(default)]
    pub stars_per_day: Option<f64>,
}

/// A cleaned row with variance-stabilized and composite metrics appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedRecord {
    pub repo_name: String,
    pub language: String,
    #[serde(with = "time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "time::rfc3339")]
    pub updated_at: DateTime<Utc>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: Option<u64>,
    pub watchers_count: Option<u64>,
    pub size: u64,
    pub language_source: String,
    pub repo_age_days: i64,
    pub stars_per_day: f64,
    pub log_stars: f64,
    pub log_forks: f64,
    pub log_watchers: Option<f64>,
    pub repo_age_years: f64,
    pub days_since_last_update: i64,
    pub popularity_score: Option<f64>,
    pub engagement_ratio: f64,
}

/// Parse a count cell. Integral float spellings such as `12.0` are accepted
/// because spreadsheet tools write integer columns containing nulls that way.
pub fn parse_count(raw: &str) -> Result<u64, String> {
    let value = raw.trim();
    if let Ok(count) = value.parse::<u64>() {
        return Ok(count);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
            Ok(f as u64)
        }
        _ => Err(format!("'{value}' is not a non-negative integer count")),
    }
}

fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_count(value).map(Some).map_err(de::Error::custom),
    }
}

fn required_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_accepts_integral_spellings() {
        assert_eq!(parse_count("42"), Ok(42));
        assert_eq!(parse_count(" 7 "), Ok(7));
        assert_eq!(parse_count("100000.0"), Ok(100_000));
    }

    #[test]
    fn test_parse_count_rejects_negative_and_fractional() {
        assert!(parse_count("-1").is_err());
        assert!(parse_count("2.5").is_err());
        assert!(parse_count("NaN").is_err());
        assert!(parse_count("many").is_err());
    }

    #[test]
    fn test_merged_record_keeps_raw_fields() {
        let raw = RawRecord {
            repo_name: "k8s".to_string(),
            language: None,
            created_at: "2014-06-06T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            stargazers_count: Some(1),
            forks_count: None,
            open_issues_count: Some(3),
            watchers_count: Some(4),
            size: None,
        };

        let merged = MergedRecord::from_raw(raw, "go");
        assert_eq!(merged.language_source, "go");
        assert_eq!(merged.language, None);
        assert_eq!(merged.stargazers_count, Some(1));
        assert_eq!(merged.forks_count, None);
    }
}
