//! HTTP price oracle client
//!
//! Quotes the native token's USD price from a third-party HTTP feed. Only the
//! numeric result is consumed; an unreachable or malformed feed surfaces as
//! "unavailable" and is never fatal to the caller.

use std::time::Duration;

use crate::{TnsError, TnsResult};

/// JSON field carrying the quote in the feed's response body
const PRICE_FIELD: &str = "USD";

/// Client for a single-endpoint JSON price feed
pub struct PriceOracle {
    client: reqwest::Client,
    url: String,
}

impl PriceOracle {
    /// Create an oracle client for a feed endpoint
    pub fn new(url: impl Into<String>, timeout: Duration) -> TnsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TnsError::Configuration(e.to_string()))?;
        Ok(Self { client, url: url.into() })
    }

    /// Current USD price, or `None` when the feed is unavailable
    pub async fn usd_price(&self) -> Option<f64> {
        match self.fetch().await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "price oracle unavailable");
                None
            }
        }
    }

    async fn fetch(&self) -> TnsResult<f64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TnsError::OracleUnavailable(e.to_string()))?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TnsError::OracleUnavailable(e.to_string()))?;
        body.get(PRICE_FIELD)
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| {
                TnsError::OracleUnavailable(format!("response has no numeric {PRICE_FIELD} field"))
            })
    }
}
