//! sqlreport - Parameterized SQL templates for shareable analytics reports
//!
//! Templates are plain SQL with a small set of placeholders (`{{website_id}}`,
//! `[[ AND {{created_at}} ]]`, `{{limit}}`, ...). This library:
//!
//! - detects which placeholders a template uses ([`detect()`])
//! - pulls hardcoded filter values back out of existing SQL ([`extract()`])
//! - rewrites a template into executable SQL ([`substitute()`])
//! - reads and writes the filter state carried in report links ([`url_state`])

pub mod cli;
pub mod detect;
pub mod error;
pub mod extract;
pub mod substitute;
pub mod template;
pub mod url_state;

pub use detect::{detect, DetectionFlags};
pub use error::{Error, Result};
pub use extract::{extract, ParsedDateRange, ParsedFilters};
pub use substitute::{
    render, render_at, substitute, DateRange, EventTable, PathOperator, Rendered,
    SubstitutionParams,
};
pub use template::PlaceholderKind;
pub use url_state::{decode_sql_param, ReportState};
