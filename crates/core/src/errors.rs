use chrono::NaiveDateTime;
use thiserror::Error;

/// Unified error type for the entire spending-analysis-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Periods / Ranges ────────────────────────────────────────────
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Date out of supported range: {0}")]
    DateOutOfRange(String),

    // ── Transactions ────────────────────────────────────────────────
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Session expired, log in again")]
    SessionExpired,

    #[error("Stale response for request #{request}, latest is #{latest}")]
    StaleResponse { request: u64, latest: u64 },

    // ── Serialization / Config ──────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    /// `true` when the caller should drop the session and send the user to log in.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, CoreError::SessionExpired)
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters from URLs: they carry the requested window and paging.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
