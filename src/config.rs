use crate::backtesting::data_fetcher::FetchSettings;
use crate::models::Timeframe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source
    pub exchange: String,
    pub timeframe: Timeframe,
    pub coinbase_api_key: String,
    pub coinbase_api_secret: String,

    // History download
    pub fetch_max_attempts: u32,
    pub fetch_retry_delay: Duration,
    pub fetch_empty_page_delay: Duration,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Config {
            exchange: env("EXCHANGE", "binance").trim().to_lowercase(),
            timeframe: env("TIMEFRAME", "1h").parse().unwrap_or(Timeframe::H1),
            coinbase_api_key: env("COINBASE_API_KEY", ""),
            coinbase_api_secret: env("COINBASE_API_SECRET", "").replace("\\n", "\n"),
            fetch_max_attempts: env("FETCH_MAX_ATTEMPTS", "5").parse().unwrap_or(5),
            fetch_retry_delay: Duration::from_secs(
                env("FETCH_RETRY_DELAY_SECS", "5").parse().unwrap_or(5),
            ),
            fetch_empty_page_delay: Duration::from_millis(
                env("FETCH_EMPTY_PAGE_DELAY_MS", "1000").parse().unwrap_or(1000),
            ),
            log_level: env("LOG_LEVEL", "info"),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            max_attempts: self.fetch_max_attempts.max(1),
            retry_delay: self.fetch_retry_delay,
            empty_page_delay: self.fetch_empty_page_delay,
        }
    }
}
