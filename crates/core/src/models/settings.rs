use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::filter::Granularity;

/// UTC-12:00 .. UTC+14:00 with some slack.
const MAX_OFFSET_MINUTES: i32 = 16 * 60;

/// Client configuration: where the API lives, how to page through it, and
/// how the chart bars are styled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the REST backend, without a trailing slash
    pub api_base_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Items requested per page
    pub page_size: u32,

    /// Upper bound on pages followed for one analysis request
    pub max_pages: u32,

    /// Offset of the user's wall clock from UTC, in minutes (e.g. 420 for
    /// UTC+07:00). `now`, the resolved windows and the bucketed transaction
    /// dates are all expressed in this frame.
    pub utc_offset_minutes: i32,

    pub chart: ChartStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 30,
            page_size: 100,
            max_pages: 50,
            utc_offset_minutes: 0,
            chart: ChartStyle::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The wall-clock offset as a chrono offset. Falls back to UTC when out of
    /// range; `validate` rejects such values.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::ValidationError(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.page_size == 0 || self.max_pages == 0 {
            return Err(CoreError::ValidationError(
                "page_size and max_pages must be greater than 0".into(),
            ));
        }
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(CoreError::ValidationError(format!(
                "utc_offset_minutes must be within ±{MAX_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        self.chart.validate()
    }
}

/// Presentation hints attached to every chart point.
/// None of these affect the aggregated numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub income_color: String,
    pub expense_color: String,

    /// Amounts are divided by this before rounding (1000 → values in thousands)
    pub value_scale: f64,

    /// Gap between the income and expense bar of one pair
    pub pair_inner_spacing: f64,

    /// Gap after each pair, by granularity
    pub daily_spacing: f64,
    pub weekly_spacing: f64,
    pub monthly_spacing: f64,
    pub yearly_spacing: f64,

    /// Label width under each pair, by granularity
    pub daily_label_width: f64,
    pub weekly_label_width: f64,
    pub monthly_label_width: f64,
    pub yearly_label_width: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            income_color: "#2ECC71".to_string(),
            expense_color: "#E74C3C".to_string(),
            value_scale: 1000.0,
            pair_inner_spacing: 2.0,
            daily_spacing: 14.0,
            weekly_spacing: 24.0,
            monthly_spacing: 30.0,
            yearly_spacing: 30.0,
            daily_label_width: 30.0,
            weekly_label_width: 52.0,
            monthly_label_width: 40.0,
            yearly_label_width: 40.0,
        }
    }
}

impl ChartStyle {
    /// Gap after a bar pair for the given bucket size.
    #[must_use]
    pub fn pair_spacing(&self, granularity: Granularity) -> f64 {
        match granularity {
            Granularity::Day => self.daily_spacing,
            Granularity::Week => self.weekly_spacing,
            Granularity::Month => self.monthly_spacing,
            Granularity::Year => self.yearly_spacing,
        }
    }

    #[must_use]
    pub fn label_width(&self, granularity: Granularity) -> f64 {
        match granularity {
            Granularity::Day => self.daily_label_width,
            Granularity::Week => self.weekly_label_width,
            Granularity::Month => self.monthly_label_width,
            Granularity::Year => self.yearly_label_width,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.value_scale.is_finite() && self.value_scale > 0.0) {
            return Err(CoreError::ValidationError(format!(
                "chart.value_scale must be a positive number, got {}",
                self.value_scale
            )));
        }
        Ok(())
    }
}
