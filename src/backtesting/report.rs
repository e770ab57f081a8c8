use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    SlHit,
    AllTpHit,
    PartialTp { hit: usize, total: usize },
    NoTargetHit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::SlHit => write!(f, "SL hit"),
            Outcome::AllTpHit => write!(f, "All TPs hit"),
            Outcome::PartialTp { hit, total } => write!(f, "Partial TP hit ({}/{})", hit, total),
            Outcome::NoTargetHit => write!(f, "No targets hit"),
        }
    }
}

/// A close price and the bar it was seen on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub time: DateTime<Utc>,
}

/// Outcome of replaying one signal against price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    // Signal
    pub pair: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    /// Sorted nearest-first for `direction`; hit indices refer to this order.
    pub take_profits: Vec<f64>,
    pub signal_time: DateTime<Utc>,

    // Entry
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,

    // Hits
    pub stop_loss_hit: bool,
    pub stop_loss_hit_time: Option<DateTime<Utc>>,
    pub take_profit_hits: BTreeMap<usize, DateTime<Utc>>,
    pub outcome: Outcome,

    // Path after entry, up to the bar that ended the walk
    pub max_price: Option<PricePoint>,
    pub min_price: Option<PricePoint>,

    pub exit_time: DateTime<Utc>,
    pub duration_secs: i64,

    // Latest data
    pub current_price: f64,
    pub current_time: DateTime<Utc>,
    pub percent_change: f64,

    pub data_points: usize,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }

    pub fn take_profit_hit_time(&self, index: usize) -> Option<DateTime<Utc>> {
        self.take_profit_hits.get(&index).copied()
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(70));
        println!("  SIGNAL BACKTEST: {} {}", self.pair, self.direction.as_str().to_uppercase());
        println!("{}", "=".repeat(70));
        println!("  Entry Price:   {}", self.entry_price);
        println!(
            "  Current Price: {} ({:+.2}%)",
            self.current_price, self.percent_change
        );
        println!("  Max Price:     {}", format_point(self.max_price));
        println!("  Min Price:     {}", format_point(self.min_price));
        println!();
        println!("  TIMELINE");
        println!("  ───────────────────────────────────");
        println!("  Signal Time:   {}", format_time(self.signal_time));
        println!("  Entry Time:    {}", format_time(self.entry_time));
        println!(
            "  Test Period:   {} to {}",
            format_time(self.period_start),
            format_time(self.period_end)
        );
        println!("  Duration:      {}", format_duration(self.duration()));
        println!("  Data Points:   {}", self.data_points);
        println!();
        println!("  STOP LOSS");
        println!("  ───────────────────────────────────");
        match self.stop_loss_hit_time {
            Some(t) => println!("  {} - Hit at {}", self.stop_loss, format_time(t)),
            None => println!("  {} - Not Hit", self.stop_loss),
        }
        println!();
        println!("  TAKE PROFITS");
        println!("  ───────────────────────────────────");
        for (i, tp) in self.take_profits.iter().enumerate() {
            match self.take_profit_hit_time(i) {
                Some(t) => println!("  TP{}: {} - Hit at {}", i + 1, tp, format_time(t)),
                None => println!("  TP{}: {} - Not Hit", i + 1, tp),
            }
        }
        println!();
        println!("  Final Result:  {}", self.outcome);
        println!("{}", "=".repeat(70));
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_point(p: Option<PricePoint>) -> String {
    match p {
        Some(p) => format!("{} ({})", p.price, format_time(p.time)),
        None => "-".to_string(),
    }
}

/// `3 days 04:00:00` style, like a timedelta.
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();
    let days = secs / 86_400;
    let rem = secs % 86_400;
    let clock = format!("{:02}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => format!("{sign}{clock}"),
        1 => format!("{sign}1 day {clock}"),
        n => format!("{sign}{n} days {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::SlHit.to_string(), "SL hit");
        assert_eq!(Outcome::AllTpHit.to_string(), "All TPs hit");
        assert_eq!(
            Outcome::PartialTp { hit: 1, total: 3 }.to_string(),
            "Partial TP hit (1/3)"
        );
        assert_eq!(Outcome::NoTargetHit.to_string(), "No targets hit");
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Outcome::PartialTp { hit: 2, total: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"PARTIAL_TP","hit":2,"total":3}"#);
        let json = serde_json::to_string(&Outcome::SlHit).unwrap();
        assert_eq!(json, r#"{"kind":"SL_HIT"}"#);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(Duration::hours(2)), "02:00:00");
        assert_eq!(format_duration(Duration::hours(25)), "1 day 01:00:00");
        assert_eq!(
            format_duration(Duration::days(3) + Duration::minutes(90)),
            "3 days 01:30:00"
        );
        assert_eq!(format_duration(Duration::zero()), "00:00:00");
    }
}
