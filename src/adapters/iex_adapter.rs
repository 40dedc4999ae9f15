//! IEX Cloud quote adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::error::PapertradeError;
use crate::domain::quote::Quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

const DEFAULT_BASE_URL: &str = "https://cloud.iexapis.com/stable";
const DEFAULT_TIMEOUT_SECS: i64 = 10;

pub struct IexAdapter {
    base_url: Url,
    api_key: String,
    client: Client,
}

fn unavailable<E: std::fmt::Display>(e: E) -> PapertradeError {
    PapertradeError::QuoteUnavailable {
        reason: e.to_string(),
    }
}

/// Quote endpoint response, reduced to the fields we read.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteBody {
    company_name: String,
    latest_price: f64,
}

impl IexAdapter {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, PapertradeError> {
        let base_url =
            Url::parse(base_url).map_err(|e| PapertradeError::ConfigInvalid {
                section: "quotes".to_string(),
                key: "base_url".to_string(),
                reason: e.to_string(),
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PapertradeError> {
        let base_url = config
            .get_string("quotes", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = config.require_string("quotes", "api_key")?;
        let timeout = config.get_int("quotes", "timeout_secs", DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, api_key, Duration::from_secs(timeout.max(1) as u64))
    }

    /// `{base}/stock/{symbol}/quote?token=KEY`, with the symbol
    /// percent-encoded as a single path segment.
    fn quote_url(&self, symbol: &str) -> Result<Url, PapertradeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| unavailable("quote base URL cannot take a path"))?
            .pop_if_empty()
            .extend(&["stock", symbol, "quote"]);
        url.query_pairs_mut().append_pair("token", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl QuotePort for IexAdapter {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        let url = self.quote_url(symbol)?;

        // Error displays strip the URL so the API token never reaches
        // logs or error pages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.without_url()))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(symbol, "quote source does not know this symbol");
            return Ok(None);
        }
        if !response.status().is_success() {
            tracing::warn!(symbol, status = %response.status(), "quote request failed");
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        let body: QuoteBody = response
            .json()
            .await
            .map_err(|e| unavailable(e.without_url()))?;
        if !body.latest_price.is_finite() || body.latest_price <= 0.0 {
            return Err(unavailable(format!(
                "quote for {symbol} has unusable price {}",
                body.latest_price
            )));
        }

        Ok(Some(Quote {
            symbol: symbol.to_string(),
            name: body.company_name,
            price: body.latest_price,
        }))
    }
}
