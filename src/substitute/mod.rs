//! Template substitution
//!
//! Rewrites a report template into executable SQL by running a fixed list of
//! rewrite passes, each over the output of the previous one:
//!
//! 1. website id
//! 2. site domain
//! 3. inline URL path
//! 4. URL path clause
//! 5. date clause
//! 6. custom variables
//!
//! A pass finds its placeholder spans, then resolves each span to replacement
//! text or leaves it unresolved. Unresolved spans are copied through as-is and
//! reported in [`Rendered::unresolved`]; substitution itself never fails.
//!
//! Text written in by a pass is protected: later passes never match inside
//! it, so a value containing placeholder syntax stays a plain value.

pub mod literal;
pub mod passes;
pub mod table;

use crate::template::PlaceholderKind;
use crate::Error;
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::{debug, trace};

pub use passes::{
    CustomVariablePass, DateClausePass, SiteDomainPass, UrlPathClausePass, UrlPathInlinePass,
    WebsiteIdPass,
};
pub use table::{infer_event_table, EventTable};

/// Days covered by the date clause when no start date is given
pub const DEFAULT_RANGE_DAYS: u64 = 30;

/// How a URL path filter compares against `url_path`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathOperator {
    /// `url_path = '<path>'`
    #[default]
    Equals,
    /// `url_path LIKE '<path>%'`
    StartsWith,
}

impl PathOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathOperator::Equals => "equals",
            PathOperator::StartsWith => "starts-with",
        }
    }
}

impl fmt::Display for PathOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "equals" => Ok(PathOperator::Equals),
            "starts-with" => Ok(PathOperator::StartsWith),
            other => Err(Error::InvalidPathOperator {
                value: other.to_string(),
            }),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: value.to_string(),
    })
}

/// Requested date range; either end may be left open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Fill open ends: `to` defaults to `today`, `from` to thirty days before it
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = self.from.unwrap_or_else(|| {
            today
                .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
                .unwrap_or(NaiveDate::MIN)
        });
        let to = self.to.unwrap_or(today);
        (from, to)
    }
}

/// Everything a template can be filled in with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionParams {
    pub website_id: Option<String>,
    pub site_domain: Option<String>,
    pub url_path: Option<String>,
    pub path_operator: PathOperator,
    pub date_range: DateRange,
    #[serde(rename = "variables", alias = "custom_variables")]
    pub custom_variables: BTreeMap<String, String>,
    /// Overrides table inference for the date clause
    pub event_table: Option<EventTable>,
    /// Warehouse project used to qualify the event views
    pub project: Option<String>,
}

impl SubstitutionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_website_id(mut self, website_id: impl Into<String>) -> Self {
        self.website_id = Some(website_id.into());
        self
    }

    pub fn with_site_domain(mut self, site_domain: impl Into<String>) -> Self {
        self.site_domain = Some(site_domain.into());
        self
    }

    pub fn with_url_path(mut self, url_path: impl Into<String>) -> Self {
        self.url_path = Some(url_path.into());
        self
    }

    pub fn with_path_operator(mut self, path_operator: PathOperator) -> Self {
        self.path_operator = path_operator;
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_range = DateRange::new(from, to);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_event_table(mut self, table: EventTable) -> Self {
        self.event_table = Some(table);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// The URL path filter, if one is active. Empty and `/` mean "no filter".
    pub fn url_path_filter(&self) -> Option<&str> {
        self.url_path
            .as_deref()
            .filter(|path| !path.is_empty() && *path != "/")
    }

    /// Value for a custom variable; exact name first, then case-insensitive
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.custom_variables
            .get(name)
            .or_else(|| {
                self.custom_variables
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

/// A placeholder occurrence found by a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpan<'t> {
    /// Byte range in the text the pass ran over
    pub range: Range<usize>,
    /// The matched text
    pub text: &'t str,
    /// Variable name, for custom variables
    pub name: Option<&'t str>,
    /// Fallback literal, for the inline URL path form
    pub literal: Option<&'t str>,
}

/// Why a placeholder was left in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// A value was supplied but it is empty
    EmptyValue,
    /// No value was supplied
    MissingValue,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::EmptyValue => f.write_str("value is empty"),
            UnresolvedReason::MissingValue => f.write_str("no value supplied"),
        }
    }
}

/// Outcome of rendering one span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved(UnresolvedReason),
}

/// A placeholder that survived substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedPlaceholder {
    pub kind: PlaceholderKind,
    pub text: String,
    pub reason: UnresolvedReason,
}

/// Result of running the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub sql: String,
    pub unresolved: Vec<UnresolvedPlaceholder>,
}

impl Rendered {
    /// True when every placeholder was filled in
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// What a pass can see while rendering a span
pub struct PassContext<'a> {
    pub params: &'a SubstitutionParams,
    /// Date the default range is computed from
    pub today: NaiveDate,
    /// Full text the pass is running over
    pub sql: &'a str,
}

/// One scan-and-replace step for a single placeholder kind
pub trait RewritePass: Send + Sync {
    fn kind(&self) -> PlaceholderKind;

    /// All spans of this pass's placeholder, in order, non-overlapping
    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>>;

    fn render(&self, span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution;
}

/// An ordered list of rewrite passes
pub struct Pipeline {
    passes: Vec<Box<dyn RewritePass>>,
}

impl Pipeline {
    pub fn new(passes: Vec<Box<dyn RewritePass>>) -> Self {
        Self { passes }
    }

    /// The six built-in passes in their required order
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(WebsiteIdPass),
            Box::new(SiteDomainPass),
            Box::new(UrlPathInlinePass),
            Box::new(UrlPathClausePass),
            Box::new(DateClausePass),
            Box::new(CustomVariablePass),
        ])
    }

    /// Placeholder kinds in execution order
    pub fn kinds(&self) -> Vec<PlaceholderKind> {
        self.passes.iter().map(|pass| pass.kind()).collect()
    }

    /// Run every pass over the template
    pub fn run(&self, template: &str, params: &SubstitutionParams, today: NaiveDate) -> Rendered {
        let mut sql = template.to_string();
        let mut unresolved = Vec::new();
        let mut inserted = Vec::new();

        for pass in &self.passes {
            sql = apply_pass(pass.as_ref(), sql, params, today, &mut unresolved, &mut inserted);
        }

        Rendered { sql, unresolved }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// The span with no byte inside inserted text, or `None`
///
/// The website id and site domain forms take an optional quote on each side,
/// which may be the closing or opening quote of a neighbouring inserted
/// literal. That quote is given back instead of dropping the span.
fn outside_inserted<'t>(
    mut span: PlaceholderSpan<'t>,
    inserted: &[Range<usize>],
) -> Option<PlaceholderSpan<'t>> {
    for range in inserted {
        if !overlaps(range, &span.range) {
            continue;
        }
        if range.end == span.range.start + 1 && span.text.starts_with(is_quote) {
            span.range.start += 1;
            span.text = &span.text[1..];
        } else if range.start + 1 == span.range.end && span.text.ends_with(is_quote) {
            span.range.end -= 1;
            span.text = &span.text[..span.text.len() - 1];
        } else {
            return None;
        }
    }
    Some(span)
}

/// Move ranges to where they land after `edits` (old range, new length)
///
/// No range may overlap an edit.
fn shift_ranges(ranges: &mut [Range<usize>], edits: &[(Range<usize>, usize)]) {
    for range in ranges.iter_mut() {
        let (removed, added) = edits
            .iter()
            .filter(|(old, _)| old.end <= range.start)
            .fold((0, 0), |(removed, added), (old, new_len)| {
                (removed + old.len(), added + new_len)
            });
        range.start = range.start - removed + added;
        range.end = range.end - removed + added;
    }
}

fn apply_pass(
    pass: &dyn RewritePass,
    sql: String,
    params: &SubstitutionParams,
    today: NaiveDate,
    unresolved: &mut Vec<UnresolvedPlaceholder>,
    inserted: &mut Vec<Range<usize>>,
) -> String {
    let spans: Vec<PlaceholderSpan<'_>> = pass
        .find(&sql)
        .into_iter()
        .filter_map(|span| {
            let text = span.text;
            let clear = outside_inserted(span, inserted.as_slice());
            if clear.is_none() {
                trace!(kind = %pass.kind(), placeholder = text, "skipping match inside inserted value");
            }
            clear
        })
        .collect();
    if spans.is_empty() {
        return sql;
    }

    let ctx = PassContext {
        params,
        today,
        sql: &sql,
    };
    let mut output = String::with_capacity(sql.len());
    let mut last_end = 0;
    let mut resolved = 0;
    let mut edits = Vec::with_capacity(spans.len());
    let mut written = Vec::new();

    for span in &spans {
        output.push_str(&sql[last_end..span.range.start]);
        let start = output.len();
        match pass.render(span, &ctx) {
            Resolution::Resolved(text) => {
                output.push_str(&text);
                if !text.is_empty() {
                    written.push(start..output.len());
                }
                resolved += 1;
            }
            Resolution::Unresolved(reason) => {
                trace!(kind = %pass.kind(), placeholder = span.text, %reason, "placeholder left unresolved");
                output.push_str(span.text);
                unresolved.push(UnresolvedPlaceholder {
                    kind: pass.kind(),
                    text: span.text.to_string(),
                    reason,
                });
            }
        }
        edits.push((span.range.clone(), output.len() - start));
        last_end = span.range.end;
    }
    output.push_str(&sql[last_end..]);

    shift_ranges(inserted, &edits);
    inserted.extend(written);
    inserted.sort_by_key(|range| range.start);

    debug!(
        kind = %pass.kind(),
        spans = spans.len(),
        resolved,
        "applied rewrite pass"
    );
    output
}

/// Substitute a template with today's local date as the date default anchor
pub fn substitute(template: &str, params: &SubstitutionParams) -> String {
    render(template, params).sql
}

/// Substitute and report placeholders that could not be filled in
pub fn render(template: &str, params: &SubstitutionParams) -> Rendered {
    render_at(template, params, Local::now().date_naive())
}

/// Like [`render`], with an explicit "today" for the default date range
pub fn render_at(template: &str, params: &SubstitutionParams, today: NaiveDate) -> Rendered {
    Pipeline::standard().run(template, params, today)
}
