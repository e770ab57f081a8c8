use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::exchange::{split_pair, Exchange};
use crate::models::{Candle, CandleSeries, Timeframe};

const BASE_URL: &str = "https://api.binance.com";
const MAX_KLINES_PER_REQUEST: usize = 1000;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

/// Public market-data client for Binance spot klines.
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `BTC/USDT` -> `BTCUSDT`
    pub fn symbol(pair: &str) -> Result<String> {
        let (base, quote) = split_pair(pair)?;
        Ok(format!("{}{}", base, quote))
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exchange for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_ohlcv_since(
        &mut self,
        pair: &str,
        tf: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<CandleSeries> {
        let symbol = Self::symbol(pair)?;
        let limit = limit.clamp(1, MAX_KLINES_PER_REQUEST);

        debug!(symbol = %symbol, interval = %tf, since = %since, "Fetching Binance klines");

        let resp = self
            .client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[
                ("symbol", symbol.clone()),
                ("interval", tf.as_str().to_string()),
                ("startTime", since.timestamp_millis().to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch klines")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let rows: Vec<Vec<Value>> = resp.json().await.context("Failed to parse klines response")?;
        let candles: Vec<Candle> = rows.iter().filter_map(|row| parse_kline(row)).collect();

        Ok(CandleSeries::from_unsorted(candles))
    }

    fn page_limit(&self) -> usize {
        MAX_KLINES_PER_REQUEST
    }

    fn request_interval(&self) -> Duration {
        MIN_REQUEST_INTERVAL
    }
}

/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`
fn parse_kline(row: &[Value]) -> Option<Candle> {
    let num = |v: &Value| -> Option<f64> {
        match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };

    Some(Candle {
        timestamp: DateTime::from_timestamp_millis(row.first()?.as_i64()?)?,
        open: num(row.get(1)?)?,
        high: num(row.get(2)?)?,
        low: num(row.get(3)?)?,
        close: num(row.get(4)?)?,
        volume: num(row.get(5)?)?,
    })
}
