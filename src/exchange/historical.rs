use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::exchange::Exchange;
use crate::models::{Candle, CandleSeries, Timeframe};

/// An Exchange implementation that replays pre-loaded historical data.
/// A cursor (`now`) controls which candles are visible: only candles
/// with timestamp <= now are returned.
pub struct HistoricalExchange {
    data: HashMap<Timeframe, Vec<Candle>>,
    now: DateTime<Utc>,
    symbol: String,
}

impl HistoricalExchange {
    pub fn new(symbol: &str) -> Self {
        Self {
            data: HashMap::new(),
            now: Utc::now(),
            symbol: symbol.to_string(),
        }
    }

    /// Replay a JSON array of candles (the `Candle` serde shape) for one
    /// pair and timeframe. The replay clock is set to the last candle.
    pub fn from_json_file(symbol: &str, tf: Timeframe, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read candles from {}", path.display()))?;
        let candles: Vec<Candle> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse candles in {}", path.display()))?;

        let mut exchange = Self::new(symbol);
        exchange.load(tf, candles);

        let (Some(first), Some(last)) = (exchange.earliest_time(), exchange.latest_time()) else {
            bail!("No candles in {}", path.display());
        };
        exchange.set_time(last);
        info!(
            "Replaying {} {} from {} to {}",
            exchange.symbol(),
            tf,
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
        Ok(exchange)
    }

    /// Load candles for a specific timeframe. Order and duplicates are
    /// normalised on the way in.
    pub fn load(&mut self, tf: Timeframe, candles: Vec<Candle>) {
        let series = CandleSeries::from_unsorted(candles);
        self.data.insert(tf, series.into_iter().collect());
    }

    /// Move the replay clock.
    pub fn set_time(&mut self, t: DateTime<Utc>) {
        self.now = t;
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the earliest timestamp across all loaded timeframes.
    pub fn earliest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.first().map(|c| c.timestamp))
            .min()
    }

    /// Get the latest timestamp across all loaded timeframes.
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.last().map(|c| c.timestamp))
            .max()
    }

    /// Candles in `[since, now]`, capped at `limit`.
    fn visible_candles(&self, tf: Timeframe, since: DateTime<Utc>, limit: usize) -> CandleSeries {
        if let Some(all) = self.data.get(&tf) {
            return window(all, since, self.now, limit);
        }
        // 4h can be served from loaded 1h data
        if tf == Timeframe::H4 {
            if let Some(h1) = self.data.get(&Timeframe::H1) {
                let h4 = CandleSeries::new(h1.clone()).resample(tf.as_duration());
                return window(h4.as_slice(), since, self.now, limit);
            }
        }
        CandleSeries::default()
    }
}

fn window(all: &[Candle], since: DateTime<Utc>, now: DateTime<Utc>, limit: usize) -> CandleSeries {
    let start = all.partition_point(|c| c.timestamp < since);
    let end = all.partition_point(|c| c.timestamp <= now);
    if start >= end {
        return CandleSeries::default();
    }
    CandleSeries::new(all[start..end.min(start + limit)].to_vec())
}

#[async_trait]
impl Exchange for HistoricalExchange {
    fn name(&self) -> &'static str {
        "historical"
    }

    async fn fetch_ohlcv_since(
        &mut self,
        pair: &str,
        tf: Timeframe,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<CandleSeries> {
        if !pair.eq_ignore_ascii_case(&self.symbol) {
            bail!("No replay data for {} (loaded {})", pair, self.symbol);
        }
        Ok(self.visible_candles(tf, since, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_time, make_closes};
    use chrono::Duration;

    fn loaded(n: usize) -> HistoricalExchange {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let mut ex = HistoricalExchange::new("BTC/USDT");
        ex.load(Timeframe::H1, make_closes(&closes).into_iter().collect());
        ex
    }

    #[tokio::test]
    async fn serves_pages_from_since() {
        let mut ex = loaded(10);
        let page = ex
            .fetch_ohlcv_since("BTC/USDT", Timeframe::H1, base_time() + Duration::hours(3), 4)
            .await
            .unwrap();
        assert_eq!(page.len(), 4);
        assert_eq!(page[0].close, 103.0);
        assert_eq!(page[3].close, 106.0);
    }

    #[tokio::test]
    async fn cursor_hides_future_candles() {
        let mut ex = loaded(10);
        ex.set_time(base_time() + Duration::hours(2));
        let page = ex
            .fetch_ohlcv_since("BTC/USDT", Timeframe::H1, base_time(), 100)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);

        ex.set_time(base_time() - Duration::hours(1));
        let page = ex
            .fetch_ohlcv_since("BTC/USDT", Timeframe::H1, base_time(), 100)
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn rejects_other_pairs() {
        let mut ex = loaded(3);
        let err = ex
            .fetch_ohlcv_since("ETH/USDT", Timeframe::H1, base_time(), 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ETH/USDT"));
    }

    #[tokio::test]
    async fn four_hour_from_hourly() {
        let mut ex = loaded(8);
        let page = ex
            .fetch_ohlcv_since("BTC/USDT", Timeframe::H4, base_time(), 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].open, 100.0);
        assert_eq!(page[0].close, 103.0);
    }

    #[test]
    fn time_bounds() {
        let ex = loaded(5);
        assert_eq!(ex.earliest_time(), Some(base_time()));
        assert_eq!(ex.latest_time(), Some(base_time() + Duration::hours(4)));
        assert_eq!(HistoricalExchange::new("X/Y").latest_time(), None);
    }

    #[test]
    fn loads_json_file() {
        let series = make_closes(&[1.0, 2.0]);
        let path = std::env::temp_dir().join(format!("replay-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(series.as_slice()).unwrap()).unwrap();

        let ex = HistoricalExchange::from_json_file("BTC/USDT", Timeframe::H1, &path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ex.symbol(), "BTC/USDT");
        assert_eq!(ex.latest_time(), Some(base_time() + Duration::hours(1)));

        assert!(HistoricalExchange::from_json_file("BTC/USDT", Timeframe::H1, "/nonexistent/x.json").is_err());
    }

    #[tokio::test]
    async fn json_replay_clock_stops_at_last_candle() {
        let path = std::env::temp_dir().join(format!("replay-clock-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(make_closes(&[1.0, 2.0, 3.0]).as_slice()).unwrap())
            .unwrap();
        let mut ex = HistoricalExchange::from_json_file("BTC/USDT", Timeframe::H1, &path).unwrap();
        std::fs::remove_file(&path).ok();

        let page = ex
            .fetch_ohlcv_since("BTC/USDT", Timeframe::H1, base_time(), 100)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.last().unwrap().timestamp, base_time() + Duration::hours(2));
    }

    #[test]
    fn empty_json_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("replay-empty-{}.json", std::process::id()));
        std::fs::write(&path, "[]").unwrap();
        let err = HistoricalExchange::from_json_file("BTC/USDT", Timeframe::H1, &path).err().unwrap();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().starts_with("No candles in"));
    }
}
