pub mod binance;
pub mod coinbase;
pub mod historical;

pub use binance::BinanceClient;
pub use coinbase::CoinbaseClient;
pub use historical::HistoricalExchange;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::Config;
use crate::models::{CandleSeries, Timeframe};

/// A venue that serves historical OHLCV bars one page at a time.
///
/// Pagination, retries and pacing live in
/// [`fetch_history`](crate::backtesting::data_fetcher::fetch_history); an
/// implementation only answers a single request.
#[async_trait]
pub trait Exchange: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `limit` bars for `pair` (e.g. `BTC/USDT`) starting at or after
    /// `since`, oldest first.
    async fn fetch_ohlcv_since(
        &mut self,
        pair: &str,
        tf: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<CandleSeries>;

    /// Largest page the venue serves.
    fn page_limit(&self) -> usize {
        500
    }

    /// Pause between consecutive requests.
    fn request_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// Venue selected by `cfg.exchange`.
pub fn connect(cfg: &Config) -> Result<Box<dyn Exchange>> {
    match cfg.exchange.as_str() {
        "binance" => Ok(Box::new(BinanceClient::new())),
        "coinbase" => Ok(Box::new(CoinbaseClient::new(cfg))),
        other => bail!("Unsupported exchange '{}' (expected binance or coinbase)", other),
    }
}

/// `BTC/USDT` -> (`BTC`, `USDT`)
pub(crate) fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        _ => bail!("Invalid pair '{}', expected BASE/QUOTE", pair),
    }
}
