//! Compiled patterns for each placeholder form

use regex::Regex;
use std::sync::LazyLock;

/// `{{website_id}}`, with any quote characters already around it
pub static WEBSITE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)['"]?\{\{\s*website_id\s*\}\}['"]?"#).expect("invalid website id pattern")
});

/// `{{nettside}}`, with any quote characters already around it
pub static SITE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)['"]?\{\{\s*nettside\s*\}\}['"]?"#).expect("invalid site domain pattern")
});

/// `[[ {{url_sti}} -- ]] '<literal>'`. Group 1 is the fallback literal, quotes included.
pub static URL_PATH_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[\s*\{\{\s*(?:url_sti|url_path)\s*\}\}\s*--\s*\]\]\s*('(?:[^']|'')*')")
        .expect("invalid inline url path pattern")
});

/// `[[ AND {{url_sti}} ]]`
pub static URL_PATH_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[\s*AND\s*\{\{\s*(?:url_sti|url_path)\s*\}\}\s*\]\]")
        .expect("invalid url path clause pattern")
});

/// `[[ AND {{created_at}} ]]`
pub static DATE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[\s*AND\s*\{\{\s*created_at\s*\}\}\s*\]\]")
        .expect("invalid date clause pattern")
});

/// `{{identifier}}`. Group 1 is the identifier.
pub static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").expect("invalid variable pattern")
});

/// `{{name}}` for any name without whitespace or braces. Group 1 is the name.
///
/// Variable map keys need not be identifiers, so substitution matches this
/// wider form; detection only reports identifiers.
pub static VARIABLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("invalid variable token pattern")
});

/// Values emitted as unquoted numeric literals
pub static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+\.?[0-9]*$").expect("invalid numeric pattern"));
