#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use signal_tester::models::{Candle, CandleSeries};

/// 2023-11-15 08:00:00 UTC
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, 15, 8, 0, 0).unwrap()
}

/// Hourly flat candles from `base_time()`, one per close.
pub fn make_closes(closes: &[f64]) -> CandleSeries {
    make_candles_from(base_time(), Duration::hours(1), closes)
}

pub fn make_candles_from(start: DateTime<Utc>, step: Duration, closes: &[f64]) -> CandleSeries {
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            timestamp: start + step * i as i32,
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 100.0,
        })
        .collect();

    CandleSeries::new(candles)
}

pub const BUY_SIGNAL: &str =
    "BTC/USDT Buy at 35000, SL at 34500, TP1 at 35500, Time: 2023-11-15 08:00";

pub const SELL_SIGNAL: &str =
    "ETH/USDT Sell at 2000, SL: 2050, TP1 1950, TP2 1900, Time: 2023-11-15 08:00";
