use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::period::PeriodKey;

/// Which side of a bar pair a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    Income,
    Expense,
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Series::Income => write!(f, "income"),
            Series::Expense => write!(f, "expense"),
        }
    }
}

/// A single bar for the bar-chart component.
///
/// The core generates these and the frontend just renders them. Points come in
/// pairs per bucket: the labelled income bar, then the unlabelled expense bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Amount in thousands, rounded to 2 decimals
    pub value: f64,

    /// Bucket label; only set on the income bar
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,

    pub series: Series,

    /// Bar color, e.g. "#2ECC71"
    pub front_color: String,

    /// Gap after this bar
    pub spacing: f64,

    pub label_width: f64,
}

/// Income and expense totals for one bucket, in raw currency units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBucket {
    pub key: PeriodKey,

    /// First day of the bucket (midnight)
    pub boundary: NaiveDate,

    /// Display label, see `PeriodService::period_label`
    pub label: String,

    pub income: f64,
    pub expense: f64,
}

impl PeriodBucket {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.income == 0.0 && self.expense == 0.0
    }
}
