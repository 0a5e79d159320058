//! Named filter keys for the contract opportunities dataset.
//!
//! These map friendly request keys onto fixed warehouse columns. A preset only
//! emits a condition when every column it references is in the allowlist.

use serde_json::Value;

use crate::allowlist::ColumnAllowlist;
use crate::escape::{
    escape_literal, literal_list, quote_identifier, quote_literal, render_operand, scalar_text,
    text_operand,
};

const TYPE_COL: &str = "TYPE";
const PIID_COL: &str = "AWARD_ID_PIID";
const AWARD_AMOUNT_COL: &str = "AWARD$";
const AGENCY_COL: &str = "Department/Ind.Agency";
const NAICS_NUMBER_COL: &str = "NAICSCODE";
const NAICS_TEXT_COL: &str = "NAICS_CODE";
const AWARDEE_COL: &str = "AWARDEE";
const PSC_COL: &str = "PRODUCT_OR_SERVICE_CODE";
const AWARD_NUMBER_COL: &str = "AWARDNUMBER";
const AWARD_DATE_COL: &str = "AWARDDATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractPreset {
    ContractType,
    HasExecutionData,
    MinAwardAmount,
    MaxAwardAmount,
    Agency,
    NaicsCode,
    Awardee,
    PscCode,
    AwardId,
    AwardDateStart,
    AwardDateEnd,
}

impl ContractPreset {
    pub const ALL: &'static [ContractPreset] = &[
        Self::ContractType,
        Self::HasExecutionData,
        Self::MinAwardAmount,
        Self::MaxAwardAmount,
        Self::Agency,
        Self::NaicsCode,
        Self::Awardee,
        Self::PscCode,
        Self::AwardId,
        Self::AwardDateStart,
        Self::AwardDateEnd,
    ];

    /// Request key that activates this preset.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ContractType => "contract_type",
            Self::HasExecutionData => "has_execution_data",
            Self::MinAwardAmount => "min_award_amount",
            Self::MaxAwardAmount => "max_award_amount",
            Self::Agency => "agency",
            Self::NaicsCode => "naics_code",
            Self::Awardee => "awardee",
            Self::PscCode => "psc_code",
            Self::AwardId => "award_id",
            Self::AwardDateStart => "award_date_start",
            Self::AwardDateEnd => "award_date_end",
        }
    }

    pub fn compile(&self, value: &Value, allowlist: &ColumnAllowlist) -> Option<String> {
        let has = |col: &str| allowlist.contains(col);
        match self {
            Self::ContractType => {
                let Value::Array(items) = value else {
                    return None;
                };
                if !has(TYPE_COL) {
                    return None;
                }
                let list = literal_list(items)?;
                Some(format!("{} IN ({})", quote_identifier(TYPE_COL), list))
            }
            Self::HasExecutionData => {
                if !has(PIID_COL) {
                    return None;
                }
                let col = quote_identifier(PIID_COL);
                let text = text_operand(PIID_COL);
                match value {
                    Value::Bool(true) => Some(format!("({col} IS NOT NULL AND {text} <> '')")),
                    Value::Bool(false) => Some(format!("({col} IS NULL OR {text} = '')")),
                    _ => None,
                }
            }
            Self::MinAwardAmount | Self::MaxAwardAmount => {
                if !has(AWARD_AMOUNT_COL) {
                    return None;
                }
                let op = if *self == Self::MinAwardAmount { ">=" } else { "<=" };
                let operand = render_operand(value)?;
                Some(format!("{} {op} {operand}", quote_identifier(AWARD_AMOUNT_COL)))
            }
            Self::Agency => contains_on(AGENCY_COL, value, allowlist),
            Self::Awardee => contains_on(AWARDEE_COL, value, allowlist),
            Self::PscCode => contains_on(PSC_COL, value, allowlist),
            Self::NaicsCode => {
                let text = non_empty_text(value)?;
                let text_match = has(NAICS_TEXT_COL).then(|| ilike_contains(NAICS_TEXT_COL, &text));
                let is_numeric = text.chars().all(|c| c.is_ascii_digit());
                if is_numeric && has(NAICS_NUMBER_COL) {
                    let number_match = format!("{} = {}", quote_identifier(NAICS_NUMBER_COL), text);
                    return Some(match text_match {
                        Some(text_match) => format!("({number_match} OR {text_match})"),
                        None => number_match,
                    });
                }
                text_match
            }
            Self::AwardId => {
                if !has(AWARD_NUMBER_COL) || !has(PIID_COL) {
                    return None;
                }
                let text = non_empty_text(value)?;
                Some(format!(
                    "({} OR {})",
                    ilike_contains(AWARD_NUMBER_COL, &text),
                    ilike_contains(PIID_COL, &text)
                ))
            }
            Self::AwardDateStart | Self::AwardDateEnd => {
                if !has(AWARD_DATE_COL) {
                    return None;
                }
                let text = non_empty_text(value)?;
                let op = if *self == Self::AwardDateStart { ">=" } else { "<=" };
                Some(format!(
                    "{} {op} {}",
                    quote_identifier(AWARD_DATE_COL),
                    quote_literal(&text)
                ))
            }
        }
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    scalar_text(value).filter(|s| !s.is_empty())
}

fn ilike_contains(column: &str, text: &str) -> String {
    format!(
        "{} ILIKE '%{}%'",
        text_operand(column),
        escape_literal(text)
    )
}

fn contains_on(column: &str, value: &Value, allowlist: &ColumnAllowlist) -> Option<String> {
    if !allowlist.contains(column) {
        return None;
    }
    let text = non_empty_text(value)?;
    Some(ilike_contains(column, &text))
}
