pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{NaiveDateTime, Utc};
use models::{
    analysis::Analysis,
    period::DateRange,
    settings::{ChartStyle, Settings},
};
use providers::{auth::TokenStore, http::HttpTransactionSource, traits::TransactionSource};
use serde_json::Value;
use services::{analysis_service::AnalysisService, period_service::PeriodService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use errors::CoreError;

/// Main entry point for the spending analysis screen.
/// Holds the transaction source, the configuration and the services that
/// turn a filter selection into chart data.
#[must_use]
pub struct SpendingAnalyzer {
    settings: Settings,
    source: Box<dyn TransactionSource>,
    period_service: PeriodService,
    analysis_service: AnalysisService,
    /// Incremented by every `analyze` call; responses from older calls are dropped.
    generation: AtomicU64,
}

impl std::fmt::Debug for SpendingAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpendingAnalyzer")
            .field("source", &self.source.name())
            .field("settings", &self.settings)
            .field("generation", &self.current_generation())
            .finish()
    }
}

impl SpendingAnalyzer {
    /// Create an analyzer over any transaction source.
    pub fn new(settings: Settings, source: Box<dyn TransactionSource>) -> Result<Self, CoreError> {
        settings.validate()?;
        let analysis_service =
            AnalysisService::new(settings.chart.clone()).with_offset(settings.utc_offset());
        Ok(Self {
            settings,
            source,
            period_service: PeriodService::new(),
            analysis_service,
            generation: AtomicU64::new(0),
        })
    }

    /// Create an analyzer backed by the transactions REST API.
    pub fn with_http(settings: Settings, tokens: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let source = HttpTransactionSource::new(&settings, tokens);
        Self::new(settings, Box::new(source))
    }

    // ── Ranges ──────────────────────────────────────────────────────

    /// Current wall-clock time at the configured UTC offset, the frame every
    /// `now` argument below is expected in.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.settings.utc_offset()).naive_local()
    }

    /// Window for a UI filter selection ("Daily", "Weekly", …) relative to `now`.
    /// Unknown selections fall back to the current month.
    pub fn resolve_date_range(&self, selection: &str, now: NaiveDateTime) -> Result<DateRange, CoreError> {
        self.period_service.resolve_selection(selection, now)
    }

    // ── Analysis ────────────────────────────────────────────────────

    /// Analyse transactions the caller already has (no I/O).
    pub fn analyze_transactions(
        &self,
        transactions: &[Value],
        selection: &str,
        now: NaiveDateTime,
    ) -> Result<Analysis, CoreError> {
        let range = self.resolve_date_range(selection, now)?;
        Ok(self.build_analysis(transactions, range))
    }

    /// Fetch the selection's window from the source and analyse it.
    ///
    /// Each call starts a new request generation. If another call starts
    /// (or [`invalidate`](Self::invalidate) runs) while this one is waiting
    /// on the source, this result is stale and `CoreError::StaleResponse` is
    /// returned instead, so an old filter can never overwrite a newer one.
    pub async fn analyze(&self, selection: &str, now: NaiveDateTime) -> Result<Analysis, CoreError> {
        let request = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let range = self.resolve_date_range(selection, now)?;

        tracing::debug!(request, selection, source = self.source.name(), "fetching transactions");
        let items = self.source.fetch_transactions(&range).await?;

        let latest = self.current_generation();
        if latest != request {
            tracing::debug!(request, latest, "discarding stale analysis response");
            return Err(CoreError::StaleResponse { request, latest });
        }

        Ok(self.build_analysis(&items, range))
    }

    /// Mark every in-flight `analyze` call as stale (e.g. the screen closed).
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Generation number of the most recent request.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the chart styling. Takes effect on the next analysis.
    pub fn set_chart_style(&mut self, style: ChartStyle) -> Result<(), CoreError> {
        style.validate()?;
        self.analysis_service.set_style(style.clone());
        self.settings.chart = style;
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build_analysis(&self, transactions: &[Value], range: DateRange) -> Analysis {
        let granularity = range.granularity();
        let bucketing = self.analysis_service.bucketize(transactions, &range, granularity);
        let points = self.analysis_service.chart_points(&bucketing.buckets, granularity);
        let summary = self.analysis_service.summarize(&bucketing.buckets);

        if bucketing.skipped > 0 {
            tracing::info!(skipped = bucketing.skipped, "some transactions could not be read");
        }

        Analysis {
            range,
            buckets: bucketing.buckets,
            points,
            summary,
            skipped: bucketing.skipped,
        }
    }
}
