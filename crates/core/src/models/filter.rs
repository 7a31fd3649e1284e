use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Coarse time filter selected on the analysis screen.
///
/// Picks both the length of the analysis window and the bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    /// Last 7 days, one bar pair per day
    Daily,
    /// Last 28 days, one bar pair per week
    Weekly,
    /// Last 4 months, one bar pair per month
    Monthly,
    /// Last 4 years, one bar pair per year
    Yearly,
}

impl Filter {
    /// All filters in the order the UI shows them.
    pub const ALL: [Filter; 4] = [Filter::Daily, Filter::Weekly, Filter::Monthly, Filter::Yearly];

    /// Bucket size implied by this filter.
    #[must_use]
    pub fn granularity(self) -> Granularity {
        match self {
            Filter::Daily => Granularity::Day,
            Filter::Weekly => Granularity::Week,
            Filter::Monthly => Granularity::Month,
            Filter::Yearly => Granularity::Year,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Daily => write!(f, "Daily"),
            Filter::Weekly => write!(f, "Weekly"),
            Filter::Monthly => write!(f, "Monthly"),
            Filter::Yearly => write!(f, "Yearly"),
        }
    }
}

impl FromStr for Filter {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Filter::Daily),
            "weekly" => Ok(Filter::Weekly),
            "monthly" => Ok(Filter::Monthly),
            "yearly" => Ok(Filter::Yearly),
            _ => Err(CoreError::UnknownFilter(s.to_string())),
        }
    }
}

/// Size of one chart bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
            Granularity::Year => write!(f, "year"),
        }
    }
}
