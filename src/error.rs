use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a signal text could not be turned into a [`Signal`](crate::models::Signal).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Could not find trading pair in signal (expected e.g. BTC/USDT)")]
    MissingPair,

    #[error("Could not find direction and entry price (expected e.g. 'Buy at 35000' or 'Entry 120')")]
    MissingEntry,

    #[error("Could not find stop loss (expected e.g. 'SL at 34500')")]
    MissingStopLoss,

    #[error("Could not find take profit levels (expected e.g. 'TP1 at 35500')")]
    MissingTakeProfits,

    #[error("Could not find valid time in signal. Include time like: 'Time: YYYY-MM-DD HH:MM'")]
    MissingTime,

    #[error("Stop loss {0} equals the entry price")]
    StopLossEqualsEntry(f64),

    #[error("Signal time {signal_time} cannot be in the future (now {now})")]
    FutureTime {
        signal_time: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

/// Why a signal could not be evaluated against price history.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("No price data available to evaluate the signal")]
    NoData,

    #[error("Signal has no take-profit levels to evaluate")]
    NoTakeProfits,

    #[error("No price bar at or after signal time {0}")]
    NoBarAfterSignal(DateTime<Utc>),

    #[error("Data source failed: {0:#}")]
    DataSource(anyhow::Error),
}
