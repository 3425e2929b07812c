//! Placeholder lexical forms
//!
//! A report template is plain SQL with a handful of recognized tokens:
//!
//! - `{{website_id}}` and `{{nettside}}`, optionally already quoted
//! - `[[ {{url_sti}} -- ]] '/default'`, an inline URL path with a fallback literal
//! - `[[ AND {{url_sti}} ]]`, an optional URL path clause (`url_path` is accepted as alias)
//! - `[[ AND {{created_at}} ]]`, an optional date range clause
//! - `{{anything_else}}`, a custom variable
//!
//! The detector and the substitution passes both match through the patterns
//! below, so a template the detector flags is exactly a template a pass rewrites.

pub mod patterns;

use serde::Serialize;
use std::fmt;

/// Placeholder names with built-in meaning. Never treated as custom variables.
pub const RESERVED_NAMES: &[&str] = &["website_id", "nettside", "created_at", "url_sti", "url_path"];

/// Check whether a placeholder name is reserved (case-insensitive)
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// The kinds of placeholder a template can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    /// `{{website_id}}`
    WebsiteId,
    /// `{{nettside}}`
    SiteDomain,
    /// `[[ {{url_sti}} -- ]] '<literal>'`
    UrlPathInline,
    /// `[[ AND {{url_sti}} ]]`
    UrlPathClause,
    /// `[[ AND {{created_at}} ]]`
    DateClause,
    /// `{{name}}` for any non-reserved name
    CustomVariable,
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaceholderKind::WebsiteId => "website id",
            PlaceholderKind::SiteDomain => "site domain",
            PlaceholderKind::UrlPathInline => "inline url path",
            PlaceholderKind::UrlPathClause => "url path clause",
            PlaceholderKind::DateClause => "date clause",
            PlaceholderKind::CustomVariable => "custom variable",
        };
        f.write_str(name)
    }
}
