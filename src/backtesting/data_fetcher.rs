use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::exchange::Exchange;
use crate::models::{Candle, CandleSeries, Timeframe};

/// Retry and pacing knobs for [`fetch_history`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchSettings {
    /// Consecutive failed requests tolerated before giving up.
    pub max_attempts: u32,
    /// Wait after a request error.
    pub retry_delay: Duration,
    /// Wait after a page that had no bars at or before `end`.
    pub empty_page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
            empty_page_delay: Duration::from_secs(1),
        }
    }
}

/// Download every bar for `pair` from `start` to `end` by walking the
/// venue's pages forward.
///
/// Each page starts at the last bar already received, so consecutive pages
/// overlap by one bar; the merged series is deduplicated at the end.
pub async fn fetch_history(
    exchange: &mut dyn Exchange,
    pair: &str,
    tf: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    settings: &FetchSettings,
) -> Result<CandleSeries> {
    let page_limit = exchange.page_limit();
    let pacing = exchange.request_interval();

    let mut collected: Vec<Candle> = Vec::new();
    let mut cursor = start;
    let mut attempts = 0u32;
    let mut pages = 0usize;

    info!(
        "Fetching {} {} history from {} via {}",
        pair,
        tf,
        start.format("%Y-%m-%d %H:%M"),
        exchange.name()
    );

    while cursor < end && attempts < settings.max_attempts {
        match exchange.fetch_ohlcv_since(pair, tf, cursor, page_limit).await {
            Ok(page) => {
                if page.is_empty() {
                    debug!("Empty page at {}, stopping", cursor);
                    break;
                }

                let usable = page.until(end);
                let Some(last_ts) = usable.last().map(|c| c.timestamp) else {
                    attempts += 1;
                    debug!("No bars at or before {} (attempt {})", end, attempts);
                    tokio::time::sleep(settings.empty_page_delay).await;
                    continue;
                };

                pages += 1;
                collected.extend(usable);

                if last_ts <= cursor {
                    break;
                }
                cursor = last_ts;
                attempts = 0;

                if pages % 10 == 0 {
                    let span = (end - start).num_seconds().max(1) as f64;
                    let pct = ((cursor - start).num_seconds() as f64 / span * 100.0).min(100.0);
                    info!("  {:.0}% ({} bars so far)", pct, collected.len());
                }
            }
            Err(e) => {
                attempts += 1;
                warn!("Error fetching {} data (attempt {}): {:#}", pair, attempts, e);
                tokio::time::sleep(settings.retry_delay).await;
                continue;
            }
        }

        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }

    if collected.is_empty() {
        bail!("No historical data available for {} from {}", pair, start);
    }

    let series = CandleSeries::from_unsorted(collected);
    info!("Fetched {} {} bars in {} pages", series.len(), tf, pages);
    Ok(series)
}
