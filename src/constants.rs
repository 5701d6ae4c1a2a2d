//! Column names shared by every stage boundary.
//! Raw columns come straight from the collector; the rest are added by the pipeline.

pub const REPO_NAME: &str = "repo_name";
pub const LANGUAGE: &str = "language";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const STARGAZERS_COUNT: &str = "stargazers_count";
pub const FORKS_COUNT: &str = "forks_count";
pub const OPEN_ISSUES_COUNT: &str = "open_issues_count";
pub const WATCHERS_COUNT: &str = "watchers_count";
pub const SIZE: &str = "size";

pub const LANGUAGE_SOURCE: &str = "language_source";

pub const REPO_AGE_DAYS: &str = "repo_age_days";
pub const STARS_PER_DAY: &str = "stars_per_day";

pub const LOG_STARS: &str = "log_stars";
pub const LOG_FORKS: &str = "log_forks";
pub const LOG_WATCHERS: &str = "log_watchers";
pub const REPO_AGE_YEARS: &str = "repo_age_years";
pub const DAYS_SINCE_LAST_UPDATE: &str = "days_since_last_update";
pub const POPULARITY_SCORE: &str = "popularity_score";
pub const ENGAGEMENT_RATIO: &str = "engagement_ratio";

/// Columns every raw partition must expose
pub const RAW_SCHEMA: [&str; 9] = [
    REPO_NAME,
    LANGUAGE,
    CREATED_AT,
    UPDATED_AT,
    STARGAZERS_COUNT,
    FORKS_COUNT,
    OPEN_ISSUES_COUNT,
    WATCHERS_COUNT,
    SIZE,
];

/// Count columns that are defaulted to zero and clipped by the cleaner
pub const CLIPPED_COLUMNS: [&str; 3] = [STARGAZERS_COUNT, FORKS_COUNT, SIZE];

/// Sentinel used when a repository reports no language
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

pub const DEFAULT_CLIP_QUANTILE: f64 = 0.99;

/// Languages gathered by the collector, in collection order
pub const DEFAULT_LANGUAGES: [&str; 10] = [
    "c",
    "c++",
    "python",
    "java",
    "go",
    "rust",
    "php",
    "javascript",
    "typescript",
    "c#",
];

pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub const CONFIG_ENV: &str = "REPO_INSIGHTS_CONFIG";
pub const AS_OF_ENV: &str = "REPO_INSIGHTS_AS_OF";

/// File name a collector writes for one language partition
pub fn partition_file_name(language: &str) -> String {
    format!("{language}_repos.csv")
}

/// Header of the merged artifact
pub const MERGED_COLUMNS: [&str; 10] = [
    REPO_NAME,
    LANGUAGE,
    CREATED_AT,
    UPDATED_AT,
    STARGAZERS_COUNT,
    FORKS_COUNT,
    OPEN_ISSUES_COUNT,
    WATCHERS_COUNT,
    SIZE,
    LANGUAGE_SOURCE,
];

/// Header of the cleaned artifact
pub const CLEANED_COLUMNS: [&str; 12] = [
    REPO_NAME,
    LANGUAGE,
    CREATED_AT,
    UPDATED_AT,
    STARGAZERS_COUNT,
    FORKS_COUNT,
    OPEN_ISSUES_COUNT,
    WATCHERS_COUNT,
    SIZE,
    LANGUAGE_SOURCE,
    REPO_AGE_DAYS,
    STARS_PER_DAY,
];

/// Header of the feature-engineered artifact
pub const FEATURED_COLUMNS: [&str; 19] = [
    REPO_NAME,
    LANGUAGE,
    CREATED_AT,
    UPDATED_AT,
    STARGAZERS_COUNT,
    FORKS_COUNT,
    OPEN_ISSUES_COUNT,
    WATCHERS_COUNT,
    SIZE,
    LANGUAGE_SOURCE,
    REPO_AGE_DAYS,
    STARS_PER_DAY,
    LOG_STARS,
    LOG_FORKS,
    LOG_WATCHERS,
    REPO_AGE_YEARS,
    DAYS_SINCE_LAST_UPDATE,
    POPULARITY_SCORE,
    ENGAGEMENT_RATIO,
];
