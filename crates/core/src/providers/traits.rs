use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::period::DateRange;

/// Where analysis input comes from.
///
/// The HTTP client implements this against the backend; tests and offline
/// callers can plug in anything that yields raw transaction items. Items are
/// returned as raw JSON so that one bad entry never fails the whole fetch.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TransactionSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// All transaction items created inside `range`.
    async fn fetch_transactions(&self, range: &DateRange) -> Result<Vec<Value>, CoreError>;
}
