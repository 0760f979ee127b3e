//! Binance spot REST adapter.
//!
//! Only the read-only account endpoints the watcher needs: open orders,
//! per-symbol order history and the price ticker.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ExchangeConfig;
use crate::domain::{PriceTick, RawOrder};
use crate::error::{Result, WatcherError};
use crate::exchange::ExchangeGateway;
use crate::signing::{ApiCredentials, QuerySigner};

const OPEN_ORDERS_PATH: &str = "/api/v3/openOrders";
const ALL_ORDERS_PATH: &str = "/api/v3/allOrders";
const TICKER_PRICE_PATH: &str = "/api/v3/ticker/price";

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
    signer: QuerySigner,
}

impl BinanceClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("order-watch/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                WatcherError::Internal(format!("failed to build exchange HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer: QuerySigner::new(
                ApiCredentials::new(&config.api_key, &config.api_secret),
                config.recv_window_ms,
            ),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let query = self.signer.signed_query(params)?;
        let url = format!("{}{}?{}", self.base_url, path, query);
        let req = self.http.get(&url).headers(self.signer.headers()?);
        self.send(path, req).await
    }

    async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.send(path, self.http.get(&url)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        // 418 is the IP ban that follows ignored 429s
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            warn!(path, %status, "exchange rate limit hit");
            return Err(WatcherError::RateLimited(format!(
                "exchange GET {} rate limited: status={}",
                path, status
            )));
        }

        if !status.is_success() {
            return Err(WatcherError::Exchange(format!(
                "exchange GET {} failed: status={} body={}",
                path, status, text
            )));
        }

        debug!(path, bytes = text.len(), "exchange response");
        serde_json::from_str(&text).map_err(|e| {
            WatcherError::Exchange(format!("invalid JSON from exchange GET {}: {}", path, e))
        })
    }
}

#[async_trait]
impl ExchangeGateway for BinanceClient {
    async fn open_orders(&self) -> Result<Vec<RawOrder>> {
        self.get_signed(OPEN_ORDERS_PATH, &[]).await
    }

    async fn order_history(&self, symbol: &str) -> Result<Vec<RawOrder>> {
        self.get_signed(ALL_ORDERS_PATH, &[("symbol", symbol)]).await
    }

    async fn prices(&self) -> Result<Vec<PriceTick>> {
        self.get_public(TICKER_PRICE_PATH).await
    }
}
