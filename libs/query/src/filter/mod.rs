//! Structured filter compilation.
//!
//! A [`FilterSpec`] is a loosely-typed JSON object. Keys are interpreted as:
//! - `<col>Min` / `<col>Max` range bounds
//! - `<col>: [..]` membership lists
//! - `dataAvailability: [..]` present-and-non-empty checks
//! - `exact_values: {..}` operator filters (see [`ExactOperator`])
//! - `operator: "AND" | "OR"` joining every produced condition
//!
//! Fields outside the [`ColumnAllowlist`] are dropped without error.

mod exact;
mod presets;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::allowlist::ColumnAllowlist;
use crate::escape::{literal_list, quote_identifier, render_operand, text_operand};

pub use exact::ExactOperator;
pub use presets::ContractPreset;

const OPERATOR_KEY: &str = "operator";
const EXACT_VALUES_KEY: &str = "exact_values";
const DATA_AVAILABILITY_KEY: &str = "dataAvailability";
const RESERVED_KEYS: [&str; 3] = [OPERATOR_KEY, EXACT_VALUES_KEY, DATA_AVAILABILITY_KEY];

/// Query-string keys that carry paging or search input rather than filters.
const NON_FILTER_PARAMS: [&str; 6] = [
    "page",
    "page_size",
    "pageSize",
    "search_keywords",
    "keywords",
    "order_by",
];

/// Boolean connective applied uniformly between compiled conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    /// Case-insensitive parse. Anything else falls back to `AND` so the raw
    /// value never reaches the SQL text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("or") {
            Self::Or
        } else {
            Self::And
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    fn joiner(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// An SQL boolean expression. Empty means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledClause(String);

impl CompiledClause {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub(crate) fn from_parts(parts: Vec<String>, joiner: &str) -> Self {
        Self(parts.join(joiner))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompiledClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filter object as received from a request body or decoded query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(Map<String, Value>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object values yield an empty spec.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Decode URL query parameters. Each value is parsed as JSON when possible
    /// (`[1,2]`, `true`, `{"operator":"IS_NULL"}`) and otherwise kept as a
    /// string literal. Paging and search keys are skipped.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Map::new();
        for (key, raw) in pairs {
            let key = key.as_ref();
            if NON_FILTER_PARAMS.contains(&key) {
                continue;
            }
            let raw = raw.as_ref();
            let value = serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            map.insert(key.to_string(), value);
        }
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn operator(&self) -> LogicalOperator {
        self.0
            .get(OPERATOR_KEY)
            .and_then(Value::as_str)
            .map(LogicalOperator::parse)
            .unwrap_or_default()
    }
}

impl From<Map<String, Value>> for FilterSpec {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Compile `spec` against `allowlist` with no presets enabled.
pub fn compile_filter(spec: &FilterSpec, allowlist: &ColumnAllowlist) -> CompiledClause {
    FilterCompiler::new(allowlist).compile(spec)
}

/// Filter compiler bound to one table's columns.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    allowlist: &'a ColumnAllowlist,
    presets: &'a [ContractPreset],
}

impl<'a> FilterCompiler<'a> {
    pub fn new(allowlist: &'a ColumnAllowlist) -> Self {
        Self {
            allowlist,
            presets: &[],
        }
    }

    /// Enable named preset keys. Their conditions come first and their keys
    /// are not reconsidered by the generic steps.
    pub fn with_presets(mut self, presets: &'a [ContractPreset]) -> Self {
        self.presets = presets;
        self
    }

    pub fn compile(&self, spec: &FilterSpec) -> CompiledClause {
        if spec.is_empty() {
            return CompiledClause::empty();
        }

        let operator = spec.operator();
        let mut conditions = Vec::new();

        for preset in self.presets {
            if let Some(value) = spec.get(preset.key()) {
                if let Some(condition) = preset.compile(value, self.allowlist) {
                    conditions.push(condition);
                }
            }
        }

        self.push_range_bounds(spec, "Min", ">=", &mut conditions);
        self.push_range_bounds(spec, "Max", "<=", &mut conditions);
        self.push_list_filters(spec, &mut conditions);
        self.push_data_availability(spec, operator, &mut conditions);
        self.push_exact_values(spec, &mut conditions);

        let clause = CompiledClause::from_parts(conditions, operator.joiner());
        tracing::debug!(clause = %clause, operator = operator.as_str(), "Built filter clause");
        clause
    }

    fn is_generic_key(&self, key: &str) -> bool {
        !RESERVED_KEYS.contains(&key) && !self.presets.iter().any(|p| p.key() == key)
    }

    fn push_range_bounds(
        &self,
        spec: &FilterSpec,
        suffix: &str,
        comparison: &str,
        conditions: &mut Vec<String>,
    ) {
        for (key, value) in spec.iter() {
            if !self.is_generic_key(key) {
                continue;
            }
            let Some(column) = key.strip_suffix(suffix) else {
                continue;
            };
            if !self.allowlist.contains(column) {
                continue;
            }
            if let Some(operand) = render_operand(value) {
                conditions.push(format!(
                    "{} {} {}",
                    quote_identifier(column),
                    comparison,
                    operand
                ));
            }
        }
    }

    fn push_list_filters(&self, spec: &FilterSpec, conditions: &mut Vec<String>) {
        for (key, value) in spec.iter() {
            let Value::Array(items) = value else {
                continue;
            };
            if items.is_empty() || !self.is_generic_key(key) || !self.allowlist.contains(key) {
                continue;
            }
            if let Some(list) = literal_list(items) {
                conditions.push(format!("{} IN ({})", quote_identifier(key), list));
            }
        }
    }

    fn push_data_availability(
        &self,
        spec: &FilterSpec,
        operator: LogicalOperator,
        conditions: &mut Vec<String>,
    ) {
        let Some(Value::Array(fields)) = spec.get(DATA_AVAILABILITY_KEY) else {
            return;
        };
        let group: Vec<String> = fields
            .iter()
            .filter_map(Value::as_str)
            .filter(|field| self.allowlist.contains(field))
            .map(|field| {
                format!(
                    "{} IS NOT NULL AND {} <> ''",
                    quote_identifier(field),
                    text_operand(field)
                )
            })
            .collect();
        if !group.is_empty() {
            conditions.push(format!("({})", group.join(operator.joiner())));
        }
    }

    fn push_exact_values(&self, spec: &FilterSpec, conditions: &mut Vec<String>) {
        let Some(Value::Object(fields)) = spec.get(EXACT_VALUES_KEY) else {
            return;
        };
        for (field, value) in fields {
            if !self.allowlist.contains(field) {
                continue;
            }
            if let Some(condition) = exact::compile_exact(field, value) {
                conditions.push(condition);
            }
        }
    }
}
