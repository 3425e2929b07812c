//! Placeholder detection
//!
//! Tells a caller which filter controls a template needs. Cheap enough to run
//! on every edit of the template.

use crate::template::{is_reserved, patterns};
use serde::Serialize;

/// Which placeholders a template contains
///
/// Flags report presence in the template, not whether a value is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionFlags {
    /// `[[ AND {{created_at}} ]]` is present
    pub has_date_filter: bool,
    /// Inline or clause URL path form is present
    pub has_url_path_filter: bool,
    /// `{{website_id}}` is present
    pub has_website_id_placeholder: bool,
    /// `{{nettside}}` is present
    pub has_site_domain_placeholder: bool,
    /// Custom variable names in first-seen order
    pub custom_variable_names: Vec<String>,
}

impl DetectionFlags {
    /// True if the template contains at least one recognized placeholder
    pub fn has_placeholders(&self) -> bool {
        self.has_date_filter
            || self.has_url_path_filter
            || self.has_website_id_placeholder
            || self.has_site_domain_placeholder
            || !self.custom_variable_names.is_empty()
    }
}

/// Scan a template for recognized placeholders
pub fn detect(template: &str) -> DetectionFlags {
    DetectionFlags {
        has_date_filter: patterns::DATE_CLAUSE.is_match(template),
        has_url_path_filter: patterns::URL_PATH_INLINE.is_match(template)
            || patterns::URL_PATH_CLAUSE.is_match(template),
        has_website_id_placeholder: patterns::WEBSITE_ID.is_match(template),
        has_site_domain_placeholder: patterns::SITE_DOMAIN.is_match(template),
        custom_variable_names: custom_variable_names(template),
    }
}

/// Collect non-reserved `{{name}}` identifiers, deduplicated case-insensitively
pub fn custom_variable_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for caps in patterns::VARIABLE.captures_iter(template) {
        let name = &caps[1];
        if is_reserved(name) {
            continue;
        }
        if names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            continue;
        }
        names.push(name.to_string());
    }

    names
}
