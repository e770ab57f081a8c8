use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::EvaluationError;
use crate::exchange::Exchange;
use crate::models::{Signal, Timeframe};

use super::data_fetcher::{fetch_history, FetchSettings};
use super::evaluator::evaluate;
use super::report::EvaluationResult;

/// Downloads the price history a signal needs from one venue and replays
/// the trade against it.
pub struct SignalTester {
    exchange: Box<dyn Exchange>,
    timeframe: Timeframe,
    settings: FetchSettings,
}

impl SignalTester {
    pub fn new(exchange: Box<dyn Exchange>, timeframe: Timeframe, settings: FetchSettings) -> Self {
        Self {
            exchange,
            timeframe,
            settings,
        }
    }

    pub fn exchange_name(&self) -> &'static str {
        self.exchange.name()
    }

    /// Evaluate `signal` against everything from its timestamp up to now.
    pub async fn test_signal(&mut self, signal: &Signal) -> Result<EvaluationResult, EvaluationError> {
        self.test_signal_until(signal, Utc::now()).await
    }

    pub async fn test_signal_until(
        &mut self,
        signal: &Signal,
        end: DateTime<Utc>,
    ) -> Result<EvaluationResult, EvaluationError> {
        info!(
            "Testing {} {} signal from {} on {} ({})",
            signal.pair,
            signal.direction,
            signal.signal_time.format("%Y-%m-%d %H:%M"),
            self.exchange.name(),
            self.timeframe
        );

        let bars = fetch_history(
            self.exchange.as_mut(),
            &signal.pair,
            self.timeframe,
            signal.signal_time,
            end,
            &self.settings,
        )
        .await
        .map_err(EvaluationError::DataSource)?;

        evaluate(signal, &bars)
    }
}
