use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::Config;
use crate::models::{Candle, CandleSeries, Direction, Signal, Timeframe};

/// 2023-11-15 08:00:00 UTC, the time used by the sample signals.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, 15, 8, 0, 0).unwrap()
}

/// Hourly candles from `base_time()`, one per close, with a flat body.
pub fn make_closes(closes: &[f64]) -> CandleSeries {
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            timestamp: base_time() + Duration::hours(i as i64),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

/// `BTC/USDT Buy at 35000, SL at 34500, TP1 at 35500, Time: 2023-11-15 08:00`
pub fn sample_buy_signal() -> Signal {
    Signal {
        pair: "BTC/USDT".to_string(),
        direction: Direction::Buy,
        entry: 35000.0,
        stop_loss: 34500.0,
        take_profits: vec![35500.0],
        signal_time: base_time(),
    }
}

/// Sell 2000, stop 2050, targets listed farthest-first.
pub fn sample_sell_signal() -> Signal {
    Signal {
        pair: "ETH/USDT".to_string(),
        direction: Direction::Sell,
        entry: 2000.0,
        stop_loss: 2050.0,
        take_profits: vec![1900.0, 1950.0],
        signal_time: base_time(),
    }
}

/// A Config suitable for testing: no API keys, no retry delays.
pub fn default_test_config() -> Config {
    Config {
        exchange: "binance".to_string(),
        timeframe: Timeframe::H1,
        coinbase_api_key: String::new(),
        coinbase_api_secret: String::new(),
        fetch_max_attempts: 3,
        fetch_retry_delay: std::time::Duration::ZERO,
        fetch_empty_page_delay: std::time::Duration::ZERO,
        log_level: "ERROR".to_string(),
    }
}
