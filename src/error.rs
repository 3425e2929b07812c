//! Error types for sqlreport
//!
//! The substitution engine itself never fails: unresolved placeholders pass
//! through verbatim. Errors only come from the edges (files, params, links).

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for sqlreport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sqlreport
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    #[diagnostic(code(sqlreport::io_error))]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(
        code(sqlreport::json_error),
        help("params files are JSON objects, e.g. {{\"website_id\": \"...\", \"variables\": {{}}}}")
    )]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    #[diagnostic(code(sqlreport::invalid_date))]
    InvalidDate { value: String },

    #[error("Unknown path operator '{value}'")]
    #[diagnostic(
        code(sqlreport::invalid_path_operator),
        help("use 'equals' or 'starts-with'")
    )]
    InvalidPathOperator { value: String },

    #[error("Invalid variable '{spec}', expected name=value")]
    #[diagnostic(code(sqlreport::invalid_variable))]
    InvalidVariable { spec: String },

    #[error("Invalid report link: {message}")]
    #[diagnostic(code(sqlreport::url_state_error))]
    UrlState { message: String },
}
