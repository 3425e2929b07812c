//! The built-in rewrite passes

use super::literal::{escape_quotes, quote_literal, sql_value};
use super::table::infer_event_table;
use super::{PassContext, PathOperator, PlaceholderSpan, RewritePass, Resolution, UnresolvedReason};
use crate::template::{is_reserved, patterns, PlaceholderKind};
use regex::{Captures, Regex};

fn span_from<'t>(caps: &Captures<'t>) -> PlaceholderSpan<'t> {
    let whole = caps.get(0).expect("group 0 always participates");
    PlaceholderSpan {
        range: whole.range(),
        text: whole.as_str(),
        name: None,
        literal: None,
    }
}

fn find_all<'t>(re: &Regex, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
    re.captures_iter(sql).map(|caps| span_from(&caps)).collect()
}

/// Quoted literal for a required string value, or why it is missing
fn required_literal(value: Option<&str>) -> Resolution {
    match value {
        Some(v) if !v.trim().is_empty() => Resolution::Resolved(quote_literal(v)),
        Some(_) => Resolution::Unresolved(UnresolvedReason::EmptyValue),
        None => Resolution::Unresolved(UnresolvedReason::MissingValue),
    }
}

/// `{{website_id}}` → `'<website id>'`
pub struct WebsiteIdPass;

impl RewritePass for WebsiteIdPass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::WebsiteId
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        find_all(&patterns::WEBSITE_ID, sql)
    }

    fn render(&self, _span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        required_literal(ctx.params.website_id.as_deref())
    }
}

/// `{{nettside}}` → `'<site domain>'`
pub struct SiteDomainPass;

impl RewritePass for SiteDomainPass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::SiteDomain
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        find_all(&patterns::SITE_DOMAIN, sql)
    }

    fn render(&self, _span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        required_literal(ctx.params.site_domain.as_deref())
    }
}

/// `[[ {{url_sti}} -- ]] '/x'` → the filter path, or the fallback literal
pub struct UrlPathInlinePass;

impl RewritePass for UrlPathInlinePass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::UrlPathInline
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        patterns::URL_PATH_INLINE
            .captures_iter(sql)
            .map(|caps| PlaceholderSpan {
                literal: caps.get(1).map(|m| m.as_str()),
                ..span_from(&caps)
            })
            .collect()
    }

    fn render(&self, span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        match ctx.params.url_path_filter() {
            Some(path) => Resolution::Resolved(quote_literal(path)),
            None => Resolution::Resolved(span.literal.unwrap_or("''").to_string()),
        }
    }
}

/// `[[ AND {{url_sti}} ]]` → `AND url_path = '/x'`, `AND url_path LIKE '/x%'`, or nothing
pub struct UrlPathClausePass;

impl RewritePass for UrlPathClausePass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::UrlPathClause
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        find_all(&patterns::URL_PATH_CLAUSE, sql)
    }

    fn render(&self, _span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        let Some(path) = ctx.params.url_path_filter() else {
            return Resolution::Resolved(String::new());
        };

        let clause = match ctx.params.path_operator {
            PathOperator::Equals => format!("AND url_path = {}", quote_literal(path)),
            PathOperator::StartsWith => format!("AND url_path LIKE '{}%'", escape_quotes(path)),
        };
        Resolution::Resolved(clause)
    }
}

/// `[[ AND {{created_at}} ]]` → `AND <table>.created_at BETWEEN ... AND ...`
///
/// The start date is inclusive from midnight and the end date through 23:59:59,
/// so both ends cover whole days.
pub struct DateClausePass;

impl RewritePass for DateClausePass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::DateClause
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        find_all(&patterns::DATE_CLAUSE, sql)
    }

    fn render(&self, _span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        let (from, to) = ctx.params.date_range.resolve(ctx.today);
        let table = ctx
            .params
            .event_table
            .unwrap_or_else(|| infer_event_table(ctx.sql));

        Resolution::Resolved(format!(
            "AND {}.created_at BETWEEN TIMESTAMP('{}') AND TIMESTAMP('{}T23:59:59')",
            table.qualified(ctx.params.project.as_deref()),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        ))
    }
}

/// `{{name}}` → numeric literal or quoted string from the variable map
///
/// Identifier names are always reported when they have no value. Other names
/// (`{{my-var}}`) are only substituted when the map has them and are otherwise
/// left alone, since detection never lists them.
pub struct CustomVariablePass;

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RewritePass for CustomVariablePass {
    fn kind(&self) -> PlaceholderKind {
        PlaceholderKind::CustomVariable
    }

    fn find<'t>(&self, sql: &'t str) -> Vec<PlaceholderSpan<'t>> {
        patterns::VARIABLE_TOKEN
            .captures_iter(sql)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str();
                if is_reserved(name) {
                    return None;
                }
                Some(PlaceholderSpan {
                    name: Some(name),
                    ..span_from(&caps)
                })
            })
            .collect()
    }

    fn render(&self, span: &PlaceholderSpan<'_>, ctx: &PassContext<'_>) -> Resolution {
        let Some(name) = span.name else {
            return Resolution::Unresolved(UnresolvedReason::MissingValue);
        };

        match ctx.params.variable(name) {
            Some(value) if !value.is_empty() => Resolution::Resolved(sql_value(value)),
            Some(_) => Resolution::Unresolved(UnresolvedReason::EmptyValue),
            None if is_identifier(name) => Resolution::Unresolved(UnresolvedReason::MissingValue),
            // not a variable reference, keep the text as written
            None => Resolution::Resolved(span.text.to_string()),
        }
    }
}
