use std::str::FromStr;

use serde_json::Value;

use crate::escape::{
    escape_literal, literal_list, quote_identifier, render_operand, scalar_text, text_operand,
};

/// Operators accepted in `exact_values` entries of the form
/// `{"operator": "...", "value": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseExactOperatorError;

impl FromStr for ExactOperator {
    type Err = ParseExactOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            "CONTAINS" => Ok(Self::Contains),
            "STARTS_WITH" => Ok(Self::StartsWith),
            "ENDS_WITH" => Ok(Self::EndsWith),
            "IS_NULL" => Ok(Self::IsNull),
            "IS_NOT_NULL" => Ok(Self::IsNotNull),
            _ => Err(ParseExactOperatorError),
        }
    }
}

impl ExactOperator {
    fn comparison(&self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("!="),
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Ge => Some(">="),
            Self::Le => Some("<="),
            _ => None,
        }
    }

    fn pattern(&self, escaped: &str) -> Option<String> {
        match self {
            Self::Contains => Some(format!("%{escaped}%")),
            Self::StartsWith => Some(format!("{escaped}%")),
            Self::EndsWith => Some(format!("%{escaped}")),
            _ => None,
        }
    }

    /// Build the predicate for `column`. `value` is ignored by the null tests.
    pub fn compile(&self, column: &str, value: &Value) -> Option<String> {
        let col = quote_identifier(column);
        match self {
            Self::IsNull => Some(format!("{col} IS NULL")),
            Self::IsNotNull => Some(format!("{col} IS NOT NULL")),
            Self::Contains | Self::StartsWith | Self::EndsWith => {
                let text = scalar_text(value)?;
                let pattern = self.pattern(&escape_literal(&text))?;
                Some(format!("{} ILIKE '{pattern}'", text_operand(column)))
            }
            _ => {
                let op = self.comparison()?;
                let operand = render_operand(value)?;
                Some(format!("{col} {op} {operand}"))
            }
        }
    }
}

/// One `exact_values` entry. `column` has already passed the allowlist.
pub(super) fn compile_exact(column: &str, value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => {
            let raw_op = obj.get("operator")?;
            let op = raw_op.as_str()?.parse::<ExactOperator>().ok()?;
            let empty = Value::String(String::new());
            let operand = obj.get("value").unwrap_or(&empty);
            op.compile(column, operand)
        }
        Value::Array(items) => {
            let list = literal_list(items)?;
            Some(format!("{} IN ({})", quote_identifier(column), list))
        }
        Value::Null => Some(format!("{} IS NULL", quote_identifier(column))),
        scalar => {
            let operand = render_operand(scalar)?;
            Some(format!("{} = {}", quote_identifier(column), operand))
        }
    }
}
