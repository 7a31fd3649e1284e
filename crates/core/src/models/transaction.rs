use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;

/// Transaction types counted on the income side of the chart.
/// Every other type is an expense.
pub const INCOME_KINDS: [&str; 2] = ["income", "lend"];

/// A validated transaction as returned by the transactions API.
///
/// Built from the raw JSON item with [`Transaction::from_value`], or
/// `Transaction::try_from(&value)` for a UTC wall clock.
/// The API is inconsistent about signs, so `amount` is always stored as an
/// absolute value and the side is taken from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Backend identifier, if the item carried one
    #[serde(default)]
    pub id: Option<String>,

    /// Transaction type as sent by the backend (e.g. "income", "food", "lend")
    #[serde(rename = "type")]
    pub kind: String,

    /// Absolute amount
    pub amount: f64,

    /// When the transaction happened, as wall-clock time in the user's offset
    pub date: NaiveDateTime,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub detail: Option<String>,
}

impl Transaction {
    /// `true` for income and lend transactions.
    #[must_use]
    pub fn is_income(&self) -> bool {
        let kind = self.kind.trim();
        INCOME_KINDS.iter().any(|k| kind.eq_ignore_ascii_case(k))
    }

    /// Parse a raw API item. Dates carrying an offset (or given as epoch
    /// milliseconds) are converted to wall-clock time at `offset`; dates
    /// without one are taken as written.
    pub fn from_value(value: &Value, offset: FixedOffset) -> Result<Self, CoreError> {
        let obj = value.as_object().ok_or_else(|| {
            CoreError::MalformedTransaction(format!("expected an object, got {}", json_kind(value)))
        })?;

        let kind = match obj.get("type") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(other) => {
                return Err(CoreError::MalformedTransaction(format!(
                    "invalid type: {other}"
                )))
            }
            None => return Err(CoreError::MalformedTransaction("missing type".into())),
        };

        let amount = obj
            .get("amount")
            .ok_or_else(|| CoreError::MalformedTransaction("missing amount".into()))
            .and_then(parse_amount)?;

        let date = obj
            .get("date")
            .ok_or_else(|| CoreError::MalformedTransaction("missing date".into()))
            .and_then(|v| parse_date(v, offset))?;

        let id = match obj.get("id").or_else(|| obj.get("_id")) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            id,
            kind,
            amount: amount.abs(),
            date,
            name: optional_string(obj.get("name")),
            detail: optional_string(obj.get("detail")),
        })
    }
}

impl TryFrom<&Value> for Transaction {
    type Error = CoreError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value, Utc.fix())
    }
}

/// Finite JSON number, or a string holding one.
pub fn parse_amount(value: &Value) -> Result<f64, CoreError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|a| a.is_finite())
        .ok_or_else(|| CoreError::MalformedTransaction(format!("invalid amount: {value}")))
}

/// ISO-8601 string or epoch milliseconds, as wall-clock time at `offset`.
///
/// Accepted strings: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (also with a
/// space separator), and RFC 3339 with an offset. Offset strings and epoch
/// values are instants and get converted; the others are already wall-clock.
pub fn parse_date(value: &Value, offset: FixedOffset) -> Result<NaiveDateTime, CoreError> {
    let parsed = match value {
        Value::String(s) => parse_date_str(s.trim(), offset),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&offset).naive_local()),
        _ => None,
    };
    parsed.ok_or_else(|| CoreError::MalformedTransaction(format!("invalid date: {value}")))
}

fn parse_date_str(s: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&offset).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
