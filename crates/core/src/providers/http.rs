use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::period::DateRange;
use crate::models::settings::Settings;

use super::auth::{self, TokenStore};
use super::response;
use super::traits::TransactionSource;

const PROVIDER: &str = "TransactionsApi";

/// Transactions REST client.
///
/// - **Endpoint**: `GET {base}/transactions?createFrom=…&createTo=…&page=…&limit=…`
/// - **Auth**: bearer token from the [`TokenStore`]; a 401 (or a 403 about an
///   expired token) clears the store and yields `CoreError::SessionExpired`,
///   which the UI answers by sending the user back to log in.
/// - **Paging**: pages are followed while the response says more exist, up
///   to `Settings::max_pages`. A response without paging metadata counts as
///   "more" when the page came back full.
pub struct HttpTransactionSource {
    client: Client,
    base_url: String,
    page_size: u32,
    max_pages: u32,
    offset: FixedOffset,
    tokens: Arc<dyn TokenStore>,
}

impl HttpTransactionSource {
    pub fn new(settings: &Settings, tokens: Arc<dyn TokenStore>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.api_base_url.trim().trim_end_matches('/').to_string(),
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            offset: settings.utc_offset(),
            tokens,
        }
    }

    /// URL for one page of the transaction list.
    #[must_use]
    pub fn transactions_url(&self, range: &DateRange, page: u32) -> String {
        let (from, to) = range.query_params(self.offset);
        format!(
            "{}/transactions?createFrom={from}&createTo={to}&page={page}&limit={}",
            self.base_url, self.page_size
        )
    }

    async fn fetch_page(&self, url: &str) -> Result<Value, CoreError> {
        let token = self.tokens.token().ok_or(CoreError::SessionExpired)?;

        let resp = self.client.get(url).bearer_auth(token).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        if let Err(e) = auth::check_response(PROVIDER, status, &body) {
            if e.requires_login() {
                tracing::warn!(status, "session expired, clearing token");
                self.tokens.clear();
            }
            return Err(e);
        }

        serde_json::from_str(&body).map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse transactions response: {e}"),
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TransactionSource for HttpTransactionSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_transactions(&self, range: &DateRange) -> Result<Vec<Value>, CoreError> {
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            let url = self.transactions_url(range, page);
            let body = self.fetch_page(&url).await?;
            let hint = response::has_next_page(&body, page);

            let page_items = response::extract_items(body)?;
            let received = page_items.len();
            items.extend(page_items);

            let more = hint.unwrap_or(received >= self.page_size as usize);

            tracing::debug!(page, received, "fetched transactions page");

            if !more || received == 0 {
                return Ok(items);
            }
        }

        tracing::warn!(max_pages = self.max_pages, "stopped paging at the configured limit");
        Ok(items)
    }
}
