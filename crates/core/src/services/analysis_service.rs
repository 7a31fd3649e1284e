use std::collections::HashMap;

use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;

use crate::models::analysis::AnalysisSummary;
use crate::models::chart::{ChartPoint, PeriodBucket, Series};
use crate::models::filter::Granularity;
use crate::models::period::{DateRange, PeriodKey};
use crate::models::settings::ChartStyle;
use crate::models::transaction::Transaction;
use crate::services::period_service::PeriodService;

/// Buckets produced for one run plus how many input items were unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucketing {
    pub buckets: Vec<PeriodBucket>,
    pub skipped: usize,
}

/// Turns a flat list of transactions into per-period income/expense sums
/// and chart-ready bar pairs.
///
/// Pure and synchronous: the same inputs always give the same output.
/// Bad items never fail a run; they are logged and skipped.
pub struct AnalysisService {
    period_service: PeriodService,
    style: ChartStyle,
    offset: FixedOffset,
}

impl AnalysisService {
    pub fn new(style: ChartStyle) -> Self {
        Self {
            period_service: PeriodService::new(),
            style,
            offset: Utc.fix(),
        }
    }

    /// Wall-clock offset that transaction instants are converted to before
    /// bucketing. Must match the frame the range was resolved in.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: ChartStyle) {
        self.style = style;
    }

    /// Sum raw API items into one bucket per period of `range`.
    ///
    /// 1. Seed a zeroed bucket for every boundary, so empty periods still show up
    /// 2. Add `|amount|` of each item to its bucket's income (income/lend) or expense
    /// 3. Drop items outside every bucket; count unreadable items in `skipped`
    /// 4. Order buckets by boundary
    ///
    /// Membership is by bucket key, not by `range.contains`: the first bucket
    /// starts at the period containing `range.start()`, so a weekly range
    /// starting mid-week, or a coarser `granularity` than the range's own,
    /// also counts items dated before `range.start()` that share that first
    /// bucket. The same holds for the last bucket after `range.end()`.
    pub fn bucketize(
        &self,
        transactions: &[Value],
        range: &DateRange,
        granularity: Granularity,
    ) -> Bucketing {
        let range = range.with_granularity(granularity);
        let mut accumulator: HashMap<PeriodKey, PeriodBucket> = HashMap::new();

        for boundary in self.period_service.generate_periods(&range) {
            let key = PeriodKey::new(boundary, granularity);
            accumulator.entry(key.clone()).or_insert_with(|| PeriodBucket {
                key,
                boundary,
                label: self.period_service.period_label(boundary, granularity),
                income: 0.0,
                expense: 0.0,
            });
        }

        let mut skipped = 0;
        for item in transactions {
            let transaction = match Transaction::from_value(item, self.offset) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed transaction");
                    skipped += 1;
                    continue;
                }
            };

            let key = self.period_service.period_key(transaction.date, granularity);
            let Some(bucket) = accumulator.get_mut(&key) else {
                tracing::debug!(%key, date = %transaction.date, "transaction outside the analysed range");
                continue;
            };

            if transaction.is_income() {
                bucket.income += transaction.amount;
            } else {
                bucket.expense += transaction.amount;
            }
        }

        let mut buckets: Vec<PeriodBucket> = accumulator.into_values().collect();
        buckets.sort_by_key(|b| b.boundary);

        Bucketing { buckets, skipped }
    }

    /// Chart points for `transactions` over `range`: two per period, oldest first.
    pub fn aggregate(
        &self,
        transactions: &[Value],
        range: &DateRange,
        granularity: Granularity,
    ) -> Vec<ChartPoint> {
        let bucketing = self.bucketize(transactions, range, granularity);
        self.chart_points(&bucketing.buckets, granularity)
    }

    /// Bar pairs for already-built buckets.
    ///
    /// The income bar carries the label and the small inner gap; the expense
    /// bar carries the gap to the next pair, except after the last pair.
    #[must_use]
    pub fn chart_points(&self, buckets: &[PeriodBucket], granularity: Granularity) -> Vec<ChartPoint> {
        let pair_spacing = self.style.pair_spacing(granularity);
        let label_width = self.style.label_width(granularity);
        let mut points = Vec::with_capacity(buckets.len() * 2);

        for (i, bucket) in buckets.iter().enumerate() {
            let is_last = i + 1 == buckets.len();

            points.push(ChartPoint {
                value: self.scaled(bucket.income),
                label: Some(bucket.label.clone()),
                series: Series::Income,
                front_color: self.style.income_color.clone(),
                spacing: self.style.pair_inner_spacing,
                label_width,
            });
            points.push(ChartPoint {
                value: self.scaled(bucket.expense),
                label: None,
                series: Series::Expense,
                front_color: self.style.expense_color.clone(),
                spacing: if is_last { 0.0 } else { pair_spacing },
                label_width,
            });
        }

        points
    }

    /// Totals across buckets, in raw currency units.
    #[must_use]
    pub fn summarize(&self, buckets: &[PeriodBucket]) -> AnalysisSummary {
        let total_income: f64 = buckets.iter().map(|b| b.income).sum();
        let total_expenses: f64 = buckets.iter().map(|b| b.expense).sum();
        AnalysisSummary {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
        }
    }

    /// Divide by the configured scale and round to the nearest 0.01.
    fn scaled(&self, amount: f64) -> f64 {
        round2(amount / self.style.value_scale)
    }
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new(ChartStyle::default())
    }
}

/// Round to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
