// Ledger data model: categories, records and the aggregate view types.
//
// Field names serialize in camelCase (`categoryId`, `sortOrder`, ...) so the
// JSON surface stays compatible with existing exports.

use crate::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on category names.
pub const MAX_CATEGORY_NAME_LEN: usize = 32;

/// Calendar dates are plain `YYYY-MM-DD`, no time component.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// RECORD KIND
// ============================================================================

/// Direction of money flow. Every category and record carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(RecordKind::Income),
            "expense" => Ok(RecordKind::Expense),
            other => Err(LedgerError::Validation(format!(
                "unknown record type {other:?}, expected \"income\" or \"expense\""
            ))),
        }
    }
}

impl ToSql for RecordKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// A user-defined label that every record belongs to.
///
/// Created once, never mutated or deleted. `name` is unique within its kind,
/// not globally; `sort_order` gives the stable display ordering per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// A single dated income or expense transaction.
///
/// `kind` always equals the referenced category's kind; `date` is the
/// user-facing calendar date while `created_at` is the insertion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub category_id: i64,
    pub note: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Resolved category, attached by listing queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

// ============================================================================
// AGGREGATE VIEWS
// ============================================================================

/// Income/expense totals for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
}

/// Per-category share of one month's income or expense total.
///
/// Category fields are snapshotted at computation time, not live-linked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category_id: i64,
    pub category_name: String,
    pub category_icon: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsResponse {
    pub income_stats: Vec<CategoryStat>,
    pub expense_stats: Vec<CategoryStat>,
}

/// One month of a year-long trend; `month` is `"YYYY-MM"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTrend {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

/// Parse a `YYYY-MM-DD` calendar date, rejecting impossible dates.
pub fn parse_date(s: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| LedgerError::Validation(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}

/// Amounts must be positive with at most 2 fractional digits.
pub fn validate_amount(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    let cents = amount * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        return Err(LedgerError::Validation(format!(
            "amount {amount} has more than 2 decimal places"
        )));
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> Result<(), LedgerError> {
    if name.is_empty() {
        return Err(LedgerError::Validation(
            "category name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(LedgerError::Validation(format!(
            "category name exceeds {MAX_CATEGORY_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// First day of the month and first day of the following month, for
/// half-open `date >= start AND date < end` range queries.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), LedgerError> {
    let invalid =
        || LedgerError::Validation(format!("invalid calendar month {year:04}-{month:02}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_round_trips_through_str() {
        assert_eq!("income".parse::<RecordKind>().unwrap(), RecordKind::Income);
        assert_eq!(
            "expense".parse::<RecordKind>().unwrap(),
            RecordKind::Expense
        );
        assert!("transfer".parse::<RecordKind>().is_err());
        assert_eq!(RecordKind::Income.as_str(), "income");
    }

    #[test]
    fn parse_date_rejects_bad_syntax_and_impossible_dates() {
        assert!(parse_date("2024-03-15").is_ok());
        assert!(parse_date("2024-02-29").is_ok()); // leap year
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("15/03/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn validate_amount_bounds() {
        assert!(validate_amount(25.50).is_ok());
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.00).is_err());
        assert!(validate_amount(25.505).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn category_name_bounds() {
        assert!(validate_category_name("Dining").is_ok());
        assert!(validate_category_name("").is_err());
        assert!(validate_category_name(&"x".repeat(33)).is_err());
        assert!(validate_category_name(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn month_bounds_wraps_december() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.to_string(), "2024-12-01");
        assert_eq!(end.to_string(), "2025-01-01");
        assert!(month_bounds(2024, 0).is_err());
        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = Record {
            id: 1,
            amount: 25.5,
            kind: RecordKind::Expense,
            category_id: 2,
            note: "lunch".to_string(),
            date: parse_date("2024-03-15").unwrap(),
            created_at: Utc::now(),
            category: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["categoryId"], 2);
        assert_eq!(json["date"], "2024-03-15");
        assert!(json.get("category").is_none());
    }
}
