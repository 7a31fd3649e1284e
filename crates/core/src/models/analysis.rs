use serde::Serialize;

use super::chart::{ChartPoint, PeriodBucket};
use super::period::DateRange;

/// Totals for the summary card under the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Sum of income and lend amounts
    pub total_income: f64,

    /// Sum of every other transaction type
    pub total_expenses: f64,

    /// total_income - total_expenses
    pub balance: f64,
}

/// Result of one analysis run for a filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Window the data was requested and bucketed for
    pub range: DateRange,

    /// One entry per period, ordered by boundary, empty periods included
    pub buckets: Vec<PeriodBucket>,

    /// Two points per bucket (income, then expense)
    pub points: Vec<ChartPoint>,

    pub summary: AnalysisSummary,

    /// Items dropped because they could not be read as transactions
    pub skipped: usize,
}
