use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::CoreError;
use crate::models::filter::{Filter, Granularity};
use crate::models::period::{self, DateRange, PeriodKey, Periods};

/// Calendar logic behind the analysis chart.
///
/// Turns a filter selection plus an injected "now" into a concrete window,
/// enumerates the bucket boundaries inside it, and names the buckets.
/// Every step uses calendar arithmetic (day/week/month/year), never fixed
/// millisecond deltas, so month lengths and leap years come out right.
pub struct PeriodService;

impl PeriodService {
    pub fn new() -> Self {
        Self
    }

    /// Window and bucket size for a filter, relative to `now`.
    ///
    /// - `Daily`: the last 7 days including today
    /// - `Weekly`: the last 28 days including today
    /// - `Monthly`: the current month and the 3 before it
    /// - `Yearly`: the current year and the 3 before it
    ///
    /// The window starts at 00:00:00 and ends at 23:59:59.
    pub fn resolve_date_range(&self, filter: Filter, now: NaiveDateTime) -> Result<DateRange, CoreError> {
        let today = now.date();
        let oob = || CoreError::DateOutOfRange(format!("cannot resolve {filter} range for {now}"));

        let (first_day, last_day) = match filter {
            Filter::Daily => (today.checked_sub_days(Days::new(6)).ok_or_else(oob)?, today),
            Filter::Weekly => (today.checked_sub_days(Days::new(27)).ok_or_else(oob)?, today),
            Filter::Monthly => {
                let this_month = period::period_start(today, Granularity::Month);
                let first = this_month.checked_sub_months(Months::new(3)).ok_or_else(oob)?;
                (first, last_day_of_month(this_month).ok_or_else(oob)?)
            }
            Filter::Yearly => {
                let first = NaiveDate::from_ymd_opt(today.year() - 3, 1, 1).ok_or_else(oob)?;
                let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).ok_or_else(oob)?;
                (first, last)
            }
        };

        DateRange::new(
            start_of_day(first_day),
            end_of_day(last_day).ok_or_else(oob)?,
            filter.granularity(),
        )
    }

    /// Like [`resolve_date_range`](Self::resolve_date_range) but takes the
    /// raw selection from the UI. Anything unrecognised falls back to the
    /// current calendar month.
    pub fn resolve_selection(&self, selection: &str, now: NaiveDateTime) -> Result<DateRange, CoreError> {
        match selection.parse::<Filter>() {
            Ok(filter) => self.resolve_date_range(filter, now),
            Err(_) => {
                tracing::warn!(selection, "unknown filter, falling back to the current month");
                self.current_month_range(now)
            }
        }
    }

    /// The calendar month containing `now`, bucketed by month.
    pub fn current_month_range(&self, now: NaiveDateTime) -> Result<DateRange, CoreError> {
        let oob = || CoreError::DateOutOfRange(format!("cannot resolve current month for {now}"));
        let first = period::period_start(now.date(), Granularity::Month);
        let last = last_day_of_month(first).ok_or_else(oob)?;
        DateRange::new(start_of_day(first), end_of_day(last).ok_or_else(oob)?, Granularity::Month)
    }

    /// Bucket boundaries covering `range`, oldest first.
    ///
    /// The first boundary is the start of the bucket holding `range.start()`
    /// (for weeks, its Monday); the sequence stops before the first boundary
    /// past `range.end()`.
    #[must_use]
    pub fn generate_periods(&self, range: &DateRange) -> Periods {
        Periods::new(range)
    }

    #[must_use]
    pub fn period_key(&self, at: NaiveDateTime, granularity: Granularity) -> PeriodKey {
        PeriodKey::new(at.date(), granularity)
    }

    /// Display label for a bucket: weekday ("Mon") for days, "Jun 10" of the
    /// Monday for weeks, month abbreviation for months, 4-digit year for years.
    #[must_use]
    pub fn period_label(&self, boundary: NaiveDate, granularity: Granularity) -> String {
        match granularity {
            Granularity::Day => boundary.format("%a").to_string(),
            Granularity::Week => period::week_start(boundary).format("%b %-d").to_string(),
            Granularity::Month => boundary.format("%b").to_string(),
            Granularity::Year => boundary.format("%Y").to_string(),
        }
    }
}

impl Default for PeriodService {
    fn default() -> Self {
        Self::new()
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(23, 59, 59)
}

fn last_day_of_month(first_of_month: NaiveDate) -> Option<NaiveDate> {
    first_of_month.checked_add_months(Months::new(1))?.pred_opt()
}
