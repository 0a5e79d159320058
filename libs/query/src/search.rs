//! Free-text keyword search compilation.
//!
//! Keywords arrive as one comma-separated string. Each trimmed token becomes
//! a case-insensitive containment test across the text-bearing columns; a
//! leading `-` turns the token into an exclusion.

use serde::{Deserialize, Serialize};

use crate::allowlist::ColumnAllowlist;
use crate::escape::{escape_literal, text_operand};
use crate::filter::CompiledClause;

const NEGATION_MARKER: char = '-';
const NON_SEARCHABLE_FRAGMENTS: [&str; 6] =
    ["date", "time", "timestamp", "created", "updated", "modified"];

/// How per-term predicates are combined.
///
/// `Any` joins terms with `OR`: a row matching a positive term is returned
/// even if it also matches an excluded term. `All` joins with `AND`, so every
/// exclusion applies to every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermJoin {
    #[default]
    Any,
    All,
}

impl TermJoin {
    fn joiner(&self) -> &'static str {
        match self {
            Self::Any => " OR ",
            Self::All => " AND ",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub term_join: TermJoin,
}

impl SearchOptions {
    pub fn with_term_join(mut self, term_join: TermJoin) -> Self {
        self.term_join = term_join;
        self
    }
}

/// Identifier-like and temporal columns are excluded from keyword search.
pub fn is_searchable_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower == "id" || lower.ends_with("id") {
        return false;
    }
    !NON_SEARCHABLE_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Split a keyword string into trimmed, non-empty tokens.
pub fn split_terms(keywords: &str) -> Vec<&str> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Compile `keywords` with the default (`OR`) term join.
pub fn compile_search(keywords: &str, allowlist: Option<&ColumnAllowlist>) -> CompiledClause {
    compile_search_with(keywords, allowlist, SearchOptions::default())
}

/// Compile `keywords`. With no allowlist each term falls back to a whole-row
/// `CONTAINS_TEXT` call.
pub fn compile_search_with(
    keywords: &str,
    allowlist: Option<&ColumnAllowlist>,
    options: SearchOptions,
) -> CompiledClause {
    let terms = split_terms(keywords);
    if terms.is_empty() {
        return CompiledClause::empty();
    }

    let predicates = match allowlist {
        None => terms.iter().filter_map(|t| whole_row_predicate(t)).collect(),
        Some(allowlist) => {
            let columns: Vec<String> = allowlist
                .iter()
                .filter(|c| is_searchable_column(c))
                .map(text_operand)
                .collect();
            if columns.is_empty() {
                tracing::warn!(
                    columns = allowlist.len(),
                    "No text-searchable columns found; keyword search skipped"
                );
                return CompiledClause::empty();
            }
            terms
                .iter()
                .filter_map(|t| column_predicate(t, &columns))
                .collect()
        }
    };

    let clause = CompiledClause::from_parts(predicates, options.term_join.joiner());
    tracing::debug!(clause = %clause, "Built search clause");
    clause
}

fn column_predicate(term: &str, columns: &[String]) -> Option<String> {
    if let Some(excluded) = term.strip_prefix(NEGATION_MARKER) {
        if excluded.is_empty() {
            return None;
        }
        let escaped = escape_literal(excluded);
        let parts: Vec<String> = columns
            .iter()
            .map(|col| format!("{col} NOT ILIKE '%{escaped}%'"))
            .collect();
        return Some(parts.join(" AND "));
    }
    let escaped = escape_literal(term);
    let parts: Vec<String> = columns
        .iter()
        .map(|col| format!("{col} ILIKE '%{escaped}%'"))
        .collect();
    Some(format!("({})", parts.join(" OR ")))
}

fn whole_row_predicate(term: &str) -> Option<String> {
    match term.strip_prefix(NEGATION_MARKER) {
        Some("") => None,
        Some(excluded) => Some(format!(
            "NOT CONTAINS_TEXT('*', '{}')",
            escape_literal(excluded)
        )),
        None => Some(format!("CONTAINS_TEXT('*', '{}')", escape_literal(term))),
    }
}
