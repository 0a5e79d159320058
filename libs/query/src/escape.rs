//! Identifier and literal escaping.
//!
//! Every predicate the compilers emit is built by string interpolation, so
//! these two routines are the only places quoting happens:
//! - identifiers are wrapped in `"` with embedded `"` doubled
//! - literals are wrapped in `'` with embedded `'` doubled
//!
//! Text-context predicates reference columns through [`text_operand`].

use serde_json::Value;

const IDENT_QUOTE: char = '"';
const LITERAL_QUOTE: char = '\'';

/// Quote a column or table identifier.
///
/// A name that is already wrapped in double quotes is returned unchanged.
pub fn quote_identifier(name: &str) -> String {
    if name.len() >= 2 && name.starts_with(IDENT_QUOTE) && name.ends_with(IDENT_QUOTE) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push(IDENT_QUOTE);
    for c in name.chars() {
        if c == IDENT_QUOTE {
            out.push(IDENT_QUOTE);
        }
        out.push(c);
    }
    out.push(IDENT_QUOTE);
    out
}

/// A column as a text expression, for pattern matches and empty-string tests.
///
/// Warehouse columns may be numeric or dated; casting keeps `ILIKE` and
/// `<> ''` valid whatever the column type.
pub fn text_operand(column: &str) -> String {
    format!("CAST({} AS TEXT)", quote_identifier(column))
}

/// Double embedded single quotes without wrapping. Used inside `ILIKE` patterns.
pub fn escape_literal(value: &str) -> String {
    value.replace(LITERAL_QUOTE, "''")
}

/// Render a quoted string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Text form of a scalar JSON value, as used for `IN` lists and patterns.
///
/// Returns `None` for null, arrays and objects.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a scalar as an SQL operand.
///
/// Numbers and booleans are emitted bare; strings go through [`quote_literal`].
/// Numeric detection is by JSON type only: `"100"` stays quoted.
pub(crate) fn render_operand(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("TRUE".to_string()),
        Value::Bool(false) => Some("FALSE".to_string()),
        Value::String(s) => Some(quote_literal(s)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// `'a', 'b', 'c'` for an `IN (...)` list. Non-scalar elements are skipped.
pub(crate) fn literal_list(values: &[Value]) -> Option<String> {
    let items: Vec<String> = values
        .iter()
        .filter_map(scalar_text)
        .map(|s| quote_literal(&s))
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}
