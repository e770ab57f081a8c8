use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::Config;
use crate::exchange::{split_pair, Exchange};
use crate::models::{Candle, CandleSeries, Timeframe};

const BASE_URL: &str = "https://api.coinbase.com";
const MAX_CANDLES_PER_REQUEST: usize = 300;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Serialize)]
struct JwtClaims {
    sub: String,
    iss: String,
    nbf: u64,
    exp: u64,
    uri: String,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    start: String,
    low: String,
    high: String,
    open: String,
    close: String,
    volume: String,
}

impl RawCandle {
    fn to_candle(&self) -> Option<Candle> {
        let ts = self.start.parse::<i64>().ok()?;
        Some(Candle {
            timestamp: DateTime::from_timestamp(ts, 0)?,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self.volume.parse().ok()?,
        })
    }
}

/// Coinbase Advanced Trade market-data client. Requests are signed only when
/// API credentials are configured; the candles endpoint is public otherwise.
pub struct CoinbaseClient {
    client: Client,
    api_key: String,
    api_secret: String,
}

impl CoinbaseClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: cfg.coinbase_api_key.clone(),
            api_secret: cfg.coinbase_api_secret.clone(),
        }
    }

    /// `BTC/USD` -> `BTC-USD`
    pub fn product_id(pair: &str) -> Result<String> {
        let (base, quote) = split_pair(pair)?;
        Ok(format!("{}-{}", base, quote))
    }

    fn generate_jwt(&self, method: &str, path: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)?
            .as_secs();

        let uri = format!("{} {}{}", method, "api.coinbase.com", path);

        let claims = JwtClaims {
            sub: self.api_key.clone(),
            iss: "cdp".to_string(),
            nbf: now,
            exp: now + 120,
            uri,
        };

        let key = EncodingKey::from_ec_pem(self.api_secret.as_bytes())
            .context("Failed to parse API secret as EC key")?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.api_key.clone());
        header.typ = Some("JWT".to_string());

        encode(&header, &claims, &key).context("Failed to encode JWT")
    }

    /// Candles in `[start, end)` seconds at the venue's native granularity.
    async fn fetch_range(
        &self,
        product_id: &str,
        tf: Timeframe,
        start: i64,
        end: i64,
    ) -> Result<CandleSeries> {
        let granularity = tf
            .coinbase_granularity()
            .with_context(|| format!("Coinbase has no {} candles", tf))?;
        let path = format!("/api/v3/brokerage/market/products/{}/candles", product_id);

        let mut req = self.client.get(format!("{}{}", BASE_URL, path)).query(&[
            ("start", start.to_string()),
            ("end", end.to_string()),
            ("granularity", granularity.to_string()),
            ("limit", MAX_CANDLES_PER_REQUEST.to_string()),
        ]);
        if !self.api_key.is_empty() {
            let jwt = self.generate_jwt("GET", &path)?;
            req = req.header("Authorization", format!("Bearer {}", jwt));
        }

        let resp = req.send().await.context("Failed to fetch candles")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Coinbase API error {}: {}", status, body);
        }

        let data: CandleResponse = resp.json().await.context("Failed to parse candle response")?;

        // Coinbase returns newest first
        let candles: Vec<Candle> = data.candles.iter().filter_map(RawCandle::to_candle).collect();
        Ok(CandleSeries::from_unsorted(candles))
    }
}

#[async_trait]
impl Exchange for CoinbaseClient {
    fn name(&self) -> &'static str {
        "coinbase"
    }

    async fn fetch_ohlcv_since(
        &mut self,
        pair: &str,
        tf: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<CandleSeries> {
        let product_id = Self::product_id(pair)?;
        // No native granularity (4h): fetch 1h and resample
        let native = match tf.coinbase_granularity() {
            Some(_) => tf,
            None => Timeframe::H1,
        };
        let limit = limit.clamp(1, MAX_CANDLES_PER_REQUEST) as i64;

        let start = since.timestamp();
        let end = (start + native.as_seconds() as i64 * limit).min(Utc::now().timestamp());
        if end <= start {
            return Ok(CandleSeries::default());
        }

        debug!(product = %product_id, tf = %tf, start, end, "Fetching Coinbase candles");

        let series = self.fetch_range(&product_id, native, start, end).await?;
        if native != tf {
            Ok(series.resample(tf.as_duration()))
        } else {
            Ok(series)
        }
    }

    fn page_limit(&self) -> usize {
        MAX_CANDLES_PER_REQUEST
    }

    fn request_interval(&self) -> Duration {
        MIN_REQUEST_INTERVAL
    }
}
