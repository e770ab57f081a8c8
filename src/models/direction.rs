use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }

    /// Maps a signal keyword (`buy`, `sell`, `entry`, `long`, `short`) to a direction.
    pub fn from_keyword(word: &str) -> Option<Direction> {
        match word.to_ascii_lowercase().as_str() {
            "buy" | "entry" | "long" => Some(Direction::Buy),
            "sell" | "short" => Some(Direction::Sell),
            _ => None,
        }
    }

    /// True when `close` has reached `stop` on the losing side.
    pub fn stop_reached(&self, close: f64, stop: f64) -> bool {
        match self {
            Direction::Buy => close <= stop,
            Direction::Sell => close >= stop,
        }
    }

    /// True when `close` has reached `target` on the winning side.
    pub fn target_reached(&self, close: f64, target: f64) -> bool {
        match self {
            Direction::Buy => close >= target,
            Direction::Sell => close <= target,
        }
    }

    /// Percent move from `entry` to `price`, positive when the trade is in profit.
    pub fn percent_change(&self, entry: f64, price: f64) -> f64 {
        match self {
            Direction::Buy => (price - entry) / entry * 100.0,
            Direction::Sell => (entry - price) / entry * 100.0,
        }
    }

    /// Orders levels in the sequence price must travel favorably:
    /// ascending for buys, descending for sells.
    pub fn sort_levels(&self, levels: &mut [f64]) {
        let dir = *self;
        levels.sort_by(|a, b| {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match dir {
                Direction::Buy => ord,
                Direction::Sell => ord.reverse(),
            }
        });
    }
}
