//! SQL literal rendering

use crate::template::patterns;

/// Double every single quote so the value can sit inside a `'...'` literal
pub fn escape_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a value as a single-quoted SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_quotes(value))
}

/// Integer or decimal with an optional leading minus (`42`, `-3.14`, `7.`)
pub fn is_numeric(value: &str) -> bool {
    patterns::NUMERIC.is_match(value)
}

/// Render a custom variable value: numbers unquoted, everything else quoted
pub fn sql_value(value: &str) -> String {
    if is_numeric(value) {
        value.to_string()
    } else {
        quote_literal(value)
    }
}
