use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// A trade hypothesis extracted from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub pair: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    /// Levels in the order they appeared in the text.
    pub take_profits: Vec<f64>,
    pub signal_time: DateTime<Utc>,
}

impl Signal {
    /// Take-profit levels ordered nearest-first for this signal's direction.
    pub fn sorted_take_profits(&self) -> Vec<f64> {
        let mut levels = self.take_profits.clone();
        self.direction.sort_levels(&mut levels);
        levels
    }

    /// True when the stop-loss sits on the losing side of entry.
    pub fn stop_on_loss_side(&self) -> bool {
        match self.direction {
            Direction::Buy => self.stop_loss < self.entry,
            Direction::Sell => self.stop_loss > self.entry,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tps: Vec<String> = self.take_profits.iter().map(|tp| tp.to_string()).collect();
        write!(
            f,
            "{} {} @ {} | SL {} | TP {} | {}",
            self.pair,
            self.direction,
            self.entry,
            self.stop_loss,
            tps.join(", "),
            self.signal_time.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_buy_signal;

    #[test]
    fn sorted_take_profits_keeps_text_order_untouched() {
        let mut signal = sample_buy_signal();
        signal.take_profits = vec![135.0, 125.0, 130.0];
        assert_eq!(signal.sorted_take_profits(), vec![125.0, 130.0, 135.0]);
        assert_eq!(signal.take_profits, vec![135.0, 125.0, 130.0]);

        signal.direction = Direction::Sell;
        assert_eq!(signal.sorted_take_profits(), vec![135.0, 130.0, 125.0]);
    }

    #[test]
    fn stop_side_check() {
        let mut signal = sample_buy_signal();
        assert!(signal.stop_on_loss_side());
        signal.stop_loss = signal.entry + 100.0;
        assert!(!signal.stop_on_loss_side());
    }

    #[test]
    fn display_is_one_line() {
        let s = sample_buy_signal().to_string();
        assert_eq!(
            s,
            "BTC/USDT buy @ 35000 | SL 34500 | TP 35500 | 2023-11-15 08:00:00 UTC"
        );
    }
}
