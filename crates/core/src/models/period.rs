use chrono::{Datelike, Days, FixedOffset, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::errors::CoreError;

use super::filter::Granularity;

/// A concrete analysis window with its bucket size.
///
/// Both bounds are inclusive: `start` sits at 00:00:00 and `end` at 23:59:59
/// when produced by the period service. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        granularity: Granularity,
    ) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            granularity,
        })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Same window, different bucket size.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }

    /// `createFrom` / `createTo` query values: epoch milliseconds as strings.
    ///
    /// The range is wall-clock time at `offset`; both bounds are shifted back
    /// to UTC before conversion.
    #[must_use]
    pub fn query_params(&self, offset: FixedOffset) -> (String, String) {
        (
            epoch_millis(self.start, offset).to_string(),
            epoch_millis(self.end, offset).to_string(),
        )
    }
}

fn epoch_millis(local: NaiveDateTime, offset: FixedOffset) -> i64 {
    local.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000
}

/// Identity of one bucket: `YYYY-MM-DD` for days and weeks (the week's Monday),
/// `YYYY-MM` for months, `YYYY` for years.
///
/// Only obtainable through [`PeriodKey::new`], so two dates share a key iff
/// they fall in the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn new(date: NaiveDate, granularity: Granularity) -> Self {
        let start = period_start(date, granularity);
        let text = match granularity {
            Granularity::Day | Granularity::Week => start.format("%Y-%m-%d"),
            Granularity::Month => start.format("%Y-%m"),
            Granularity::Year => start.format("%Y"),
        };
        Self(text.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monday of the week containing `date` (a Sunday belongs to the week that
/// started six days earlier).
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Canonical first day of the bucket that contains `date`.
#[must_use]
pub fn period_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => week_start(date),
        Granularity::Month => date.with_day(1).unwrap_or(date),
        Granularity::Year => date.with_ordinal(1).unwrap_or(date),
    }
}

/// Next bucket boundary after `boundary`, using calendar arithmetic.
/// `None` only at the end of chrono's representable range.
#[must_use]
pub fn next_boundary(boundary: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => boundary.succ_opt(),
        Granularity::Week => boundary.checked_add_days(Days::new(7)),
        Granularity::Month => boundary.checked_add_months(Months::new(1)),
        Granularity::Year => boundary.checked_add_months(Months::new(12)),
    }
}

/// Ordered bucket boundaries covering a [`DateRange`].
///
/// A plain value iterator: clone it to walk the sequence again.
#[derive(Debug, Clone)]
pub struct Periods {
    next: Option<NaiveDate>,
    end: NaiveDate,
    granularity: Granularity,
}

impl Periods {
    pub fn new(range: &DateRange) -> Self {
        let granularity = range.granularity();
        Self {
            next: Some(period_start(range.start().date(), granularity)),
            end: range.end().date(),
            granularity,
        }
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl Iterator for Periods {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|d| *d <= self.end)?;
        self.next = next_boundary(current, self.granularity);
        Some(current)
    }
}

impl std::iter::FusedIterator for Periods {}
