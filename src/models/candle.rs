use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Time-ordered bars with unique timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Wraps candles that are already sorted oldest-first.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// Sorts by timestamp and keeps one candle per timestamp.
    /// When timestamps collide the candle that came later in `candles` wins.
    pub fn from_unsorted(candles: Vec<Candle>) -> Self {
        let mut by_ts: BTreeMap<DateTime<Utc>, Candle> = BTreeMap::new();
        for candle in candles {
            by_ts.insert(candle.timestamp, candle);
        }
        Self {
            candles: by_ts.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Index of the first candle with timestamp >= `ts`.
    pub fn position_at_or_after(&self, ts: DateTime<Utc>) -> Option<usize> {
        let idx = self.candles.partition_point(|c| c.timestamp < ts);
        (idx < self.candles.len()).then_some(idx)
    }

    /// Resample to a larger timeframe bucket
    pub fn resample(&self, bucket: Duration) -> CandleSeries {
        if self.candles.is_empty() {
            return CandleSeries::default();
        }
        let bucket_secs = bucket.as_secs() as i64;
        let mut result: Vec<Candle> = Vec::new();

        for candle in &self.candles {
            let ts = candle.timestamp.timestamp();
            let bucket_start = ts - ts.rem_euclid(bucket_secs);
            let bucket_ts =
                DateTime::from_timestamp(bucket_start, 0).unwrap_or(candle.timestamp);

            if let Some(last) = result.last_mut() {
                if last.timestamp == bucket_ts {
                    last.high = last.high.max(candle.high);
                    last.low = last.low.min(candle.low);
                    last.close = candle.close;
                    last.volume += candle.volume;
                    continue;
                }
            }

            result.push(Candle {
                timestamp: bucket_ts,
                ..candle.clone()
            });
        }

        CandleSeries::new(result)
    }

    /// Get candles at or before a given timestamp
    pub fn until(&self, ts: DateTime<Utc>) -> CandleSeries {
        let end = self.candles.partition_point(|c| c.timestamp <= ts);
        CandleSeries::new(self.candles[..end].to_vec())
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_time, make_closes};
    use chrono::Duration as ChronoDuration;

    fn candle_at(minutes: i64, close: f64) -> Candle {
        Candle {
            timestamp: base_time() + ChronoDuration::minutes(minutes),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn from_unsorted_sorts_and_dedups_last_write_wins() {
        let s = CandleSeries::from_unsorted(vec![
            candle_at(2, 30.0),
            candle_at(0, 10.0),
            candle_at(1, 20.0),
            candle_at(0, 11.0),
        ]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.closes(), vec![11.0, 20.0, 30.0]);
        assert!(s
            .as_slice()
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn position_at_or_after_finds_first_matching_bar() {
        let s = make_closes(&[1.0, 2.0, 3.0]);
        let t0 = base_time();
        assert_eq!(s.position_at_or_after(t0 - ChronoDuration::hours(5)), Some(0));
        assert_eq!(s.position_at_or_after(t0), Some(0));
        assert_eq!(
            s.position_at_or_after(t0 + ChronoDuration::minutes(30)),
            Some(1)
        );
        assert_eq!(s.position_at_or_after(t0 + ChronoDuration::hours(2)), Some(2));
        assert_eq!(s.position_at_or_after(t0 + ChronoDuration::hours(3)), None);
    }

    #[test]
    fn until_keeps_bars_at_or_before_cutoff() {
        let s = make_closes(&[1.0, 2.0, 3.0, 4.0]);
        let t1 = base_time() + ChronoDuration::hours(1);
        assert_eq!(s.until(t1).closes(), vec![1.0, 2.0]);
        assert!(s.until(base_time() - ChronoDuration::days(1)).is_empty());
    }

    #[test]
    fn resample_hourly_to_four_hours() {
        // make_closes spaces bars one hour apart starting at 08:00 UTC
        let s = make_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let r = s.resample(Duration::from_secs(14_400));
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].timestamp, base_time());
        assert!((r[0].close - 4.0).abs() < 1e-9);
        assert!((r[0].volume - 400.0).abs() < 1e-9);
        assert!((r[1].open - 5.0).abs() < 1e-9);
        assert!((r[1].close - 6.0).abs() < 1e-9);
    }
}
