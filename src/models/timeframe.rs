use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Bar interval. The string form (`1m`, `4h`, ...) is also the Binance
/// kline interval and the serde representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub fn as_seconds(self) -> u64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::H1 => 3600,
            Timeframe::H4 => 4 * 3600,
            Timeframe::D1 => 24 * 3600,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_seconds())
    }

    /// Coinbase candle granularity. Coinbase has no 4h bars.
    pub fn coinbase_granularity(self) -> Option<&'static str> {
        match self {
            Timeframe::M1 => Some("ONE_MINUTE"),
            Timeframe::M5 => Some("FIVE_MINUTE"),
            Timeframe::M15 => Some("FIFTEEN_MINUTE"),
            Timeframe::H1 => Some("ONE_HOUR"),
            Timeframe::H4 => None,
            Timeframe::D1 => Some("ONE_DAY"),
        }
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown timeframe '{}' (expected 1m, 5m, 15m, 1h, 4h or 1d)", s.trim()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
