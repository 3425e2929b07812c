//! Parameter extraction from existing SQL
//!
//! Pulls hardcoded filter values out of a pasted or shared query so the
//! filter controls can start from them. Never rewrites its input.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// `website_id = '<uuid-shaped token>'`. Shape only, no version or variant check.
static WEBSITE_ID_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)website_id\s*=\s*['"]([0-9a-f-]{36})['"]"#)
        .expect("invalid website id literal pattern")
});

static DATE_RANGE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)created_at\s+BETWEEN\s+TIMESTAMP\(\s*'([0-9]{4}-[0-9]{2}-[0-9]{2})[^']*'\s*\)\s+AND\s+TIMESTAMP\(\s*'([0-9]{4}-[0-9]{2}-[0-9]{2})[^']*'\s*\)",
    )
    .expect("invalid date range literal pattern")
});

static URL_PATH_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)url_path\s*=\s*'(/[^']*)'").expect("invalid url path literal pattern")
});

/// Calendar dates recovered from a `BETWEEN TIMESTAMP(...) AND TIMESTAMP(...)` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedDateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Filter values found hardcoded in a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedFilters {
    pub website_id: Option<String>,
    pub date_range: Option<ParsedDateRange>,
    pub url_path: Option<String>,
}

impl ParsedFilters {
    pub fn is_empty(&self) -> bool {
        self.website_id.is_none() && self.date_range.is_none() && self.url_path.is_none()
    }
}

/// Extract hardcoded filter values from raw SQL
pub fn extract(raw_sql: &str) -> ParsedFilters {
    ParsedFilters {
        website_id: extract_website_id(raw_sql),
        date_range: extract_date_range(raw_sql),
        url_path: extract_url_path(raw_sql),
    }
}

/// First `website_id = '<uuid>'` comparison in the query
pub fn extract_website_id(raw_sql: &str) -> Option<String> {
    WEBSITE_ID_LITERAL
        .captures(raw_sql)
        .map(|caps| caps[1].to_string())
}

/// First `created_at BETWEEN TIMESTAMP(..) AND TIMESTAMP(..)` range in the query
///
/// Time-of-day inside the timestamps is ignored. A date that is not a real
/// calendar day (e.g. `2024-02-30`) drops the whole range.
pub fn extract_date_range(raw_sql: &str) -> Option<ParsedDateRange> {
    let caps = DATE_RANGE_LITERAL.captures(raw_sql)?;
    let from = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let to = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").ok()?;
    Some(ParsedDateRange { from, to })
}

/// First `url_path = '/...'` comparison in the query
pub fn extract_url_path(raw_sql: &str) -> Option<String> {
    URL_PATH_LITERAL
        .captures(raw_sql)
        .map(|caps| caps[1].to_string())
}
