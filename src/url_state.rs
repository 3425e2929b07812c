//! Shared report links
//!
//! A shared report is a page URL whose query string carries the template and
//! the filter values. The `sql` parameter is sometimes encoded twice by the
//! page that built the link, so it gets one extra decode when it still looks
//! encoded after the normal one.

use crate::substitute::{parse_date, DateRange, EventTable, PathOperator, SubstitutionParams};
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use url::form_urlencoded;

/// Prefix for custom variable keys, e.g. `var_limit=10`
pub const VARIABLE_PREFIX: &str = "var_";

static PERCENT_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").expect("invalid percent escape pattern"));

/// Decoded SQL always has whitespace; a still-encoded one never does
fn looks_encoded(value: &str) -> bool {
    !value.chars().any(char::is_whitespace) && PERCENT_ESCAPE.is_match(value)
}

fn decode_again_if_encoded(value: String) -> String {
    if !looks_encoded(&value) {
        return value;
    }
    let decoded = urlencoding::decode(&value).map(Cow::into_owned).ok();
    match decoded {
        Some(decoded) => {
            debug!("sql parameter was encoded twice");
            decoded
        }
        None => value,
    }
}

/// Decode a raw `sql` query-string value, undoing a second encoding if present
pub fn decode_sql_param(raw: &str) -> Result<String> {
    let once = urlencoding::decode(&raw.replace('+', " "))
        .map_err(|e| Error::UrlState {
            message: format!("sql parameter is not valid UTF-8: {}", e),
        })?
        .into_owned();
    Ok(decode_again_if_encoded(once))
}

/// Template and filter values carried by a report link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportState {
    pub sql: Option<String>,
    pub website_id: Option<String>,
    pub site_domain: Option<String>,
    pub url_path: Option<String>,
    pub path_operator: PathOperator,
    pub date_range: DateRange,
    pub variables: BTreeMap<String, String>,
    pub event_table: Option<EventTable>,
    pub project: Option<String>,
}

impl ReportState {
    /// Capture a template together with the filter values it runs with
    pub fn new(sql: impl Into<String>, params: &SubstitutionParams) -> Self {
        Self {
            sql: Some(sql.into()),
            website_id: params.website_id.clone(),
            site_domain: params.site_domain.clone(),
            url_path: params.url_path.clone(),
            path_operator: params.path_operator,
            date_range: params.date_range,
            variables: params.custom_variables.clone(),
            event_table: params.event_table,
            project: params.project.clone(),
        }
    }

    /// Parse a query string (leading `?` optional, or a full URL)
    ///
    /// Unknown keys are ignored. Empty values count as absent.
    pub fn from_query(query: &str) -> Result<Self> {
        let query = match query.split_once('?') {
            Some((_, rest)) => rest,
            None => query,
        };
        let query = query.split('#').next().unwrap_or("");

        let mut state = ReportState::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match &*key {
                "sql" => state.sql = Some(decode_again_if_encoded(value.into_owned())),
                "websiteId" => state.website_id = Some(value.into_owned()),
                "siteDomain" => state.site_domain = Some(value.into_owned()),
                "urlPath" => state.url_path = Some(value.into_owned()),
                "pathOperator" => {
                    state.path_operator = value.parse().map_err(|_| Error::UrlState {
                        message: format!("unknown path operator '{}'", value),
                    })?
                }
                "from" => state.date_range.from = Some(parse_url_date(&value)?),
                "to" => state.date_range.to = Some(parse_url_date(&value)?),
                "table" => {
                    state.event_table = Some(value.parse().map_err(|message| Error::UrlState {
                        message,
                    })?)
                }
                "project" => state.project = Some(value.into_owned()),
                other => match other.strip_prefix(VARIABLE_PREFIX) {
                    Some(name) if !name.is_empty() => {
                        state.variables.insert(name.to_string(), value.into_owned());
                    }
                    _ => debug!(key = other, "ignoring unknown report link parameter"),
                },
            }
        }

        Ok(state)
    }

    /// Serialize to a query string without the leading `?`
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        if let Some(sql) = &self.sql {
            serializer.append_pair("sql", sql);
        }
        if let Some(website_id) = &self.website_id {
            serializer.append_pair("websiteId", website_id);
        }
        if let Some(site_domain) = &self.site_domain {
            serializer.append_pair("siteDomain", site_domain);
        }
        if let Some(url_path) = &self.url_path {
            serializer.append_pair("urlPath", url_path);
            if self.path_operator != PathOperator::Equals {
                serializer.append_pair("pathOperator", self.path_operator.as_str());
            }
        }
        if let Some(from) = self.date_range.from {
            serializer.append_pair("from", &from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = self.date_range.to {
            serializer.append_pair("to", &to.format("%Y-%m-%d").to_string());
        }
        for (name, value) in &self.variables {
            serializer.append_pair(&format!("{}{}", VARIABLE_PREFIX, name), value);
        }
        if let Some(table) = self.event_table {
            serializer.append_pair("table", &table.to_string());
        }
        if let Some(project) = &self.project {
            serializer.append_pair("project", project);
        }

        serializer.finish()
    }

    /// Substitution parameters for this link's filters
    pub fn params(&self) -> SubstitutionParams {
        SubstitutionParams {
            website_id: self.website_id.clone(),
            site_domain: self.site_domain.clone(),
            url_path: self.url_path.clone(),
            path_operator: self.path_operator,
            date_range: self.date_range,
            custom_variables: self.variables.clone(),
            event_table: self.event_table,
            project: self.project.clone(),
        }
    }
}

fn parse_url_date(value: &str) -> Result<chrono::NaiveDate> {
    parse_date(value).map_err(|_| Error::UrlState {
        message: format!("invalid date '{}'", value),
    })
}
