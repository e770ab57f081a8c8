use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::EvaluationError;
use crate::models::{Candle, CandleSeries, Signal};

use super::report::{EvaluationResult, Outcome, PricePoint};

/// Replays `bars` from the first bar at or after the signal time.
///
/// Every bar after the entry bar is visited in order until the stop loss
/// closes out the trade or every take-profit level has been reached. A stop
/// loss is checked before take profits on each bar, so a bar that satisfies
/// both counts only as a stop.
pub fn evaluate(signal: &Signal, bars: &CandleSeries) -> Result<EvaluationResult, EvaluationError> {
    if signal.take_profits.is_empty() {
        return Err(EvaluationError::NoTakeProfits);
    }
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(EvaluationError::NoData),
    };
    let entry_index = bars
        .position_at_or_after(signal.signal_time)
        .ok_or(EvaluationError::NoBarAfterSignal(signal.signal_time))?;
    let entry_time = bars[entry_index].timestamp;

    let direction = signal.direction;
    let levels = signal.sorted_take_profits();

    let mut max_price: Option<PricePoint> = None;
    let mut min_price: Option<PricePoint> = None;
    let mut stop_loss_hit_time: Option<DateTime<Utc>> = None;
    let mut take_profit_hits: BTreeMap<usize, DateTime<Utc>> = BTreeMap::new();

    for bar in &bars.as_slice()[entry_index + 1..] {
        track_extremes(bar, &mut max_price, &mut min_price);

        if direction.stop_reached(bar.close, signal.stop_loss) {
            debug!(
                "{} stop loss {} hit at {} (close {})",
                signal.pair, signal.stop_loss, bar.timestamp, bar.close
            );
            stop_loss_hit_time = Some(bar.timestamp);
            break;
        }

        for (i, &level) in levels.iter().enumerate() {
            if !take_profit_hits.contains_key(&i) && direction.target_reached(bar.close, level) {
                debug!(
                    "{} TP{} {} hit at {} (close {})",
                    signal.pair,
                    i + 1,
                    level,
                    bar.timestamp,
                    bar.close
                );
                take_profit_hits.insert(i, bar.timestamp);
            }
        }

        if take_profit_hits.len() == levels.len() {
            break;
        }
    }

    let outcome = if stop_loss_hit_time.is_some() {
        Outcome::SlHit
    } else if take_profit_hits.len() == levels.len() {
        Outcome::AllTpHit
    } else if !take_profit_hits.is_empty() {
        Outcome::PartialTp {
            hit: take_profit_hits.len(),
            total: levels.len(),
        }
    } else {
        Outcome::NoTargetHit
    };

    let exit_time = stop_loss_hit_time
        .or_else(|| take_profit_hits.values().max().copied())
        .unwrap_or(last.timestamp);

    info!(
        "{} {} from {}: {} ({} bars)",
        signal.pair,
        direction,
        entry_time.format("%Y-%m-%d %H:%M"),
        outcome,
        bars.len()
    );

    Ok(EvaluationResult {
        pair: signal.pair.clone(),
        direction,
        entry_price: signal.entry,
        stop_loss: signal.stop_loss,
        take_profits: levels,
        signal_time: signal.signal_time,
        entry_time,
        entry_index,
        stop_loss_hit: stop_loss_hit_time.is_some(),
        stop_loss_hit_time,
        take_profit_hits,
        outcome,
        max_price,
        min_price,
        exit_time,
        duration_secs: (exit_time - entry_time).num_seconds(),
        current_price: last.close,
        current_time: last.timestamp,
        percent_change: direction.percent_change(signal.entry, last.close),
        data_points: bars.len(),
        period_start: first.timestamp,
        period_end: last.timestamp,
    })
}

fn track_extremes(bar: &Candle, max: &mut Option<PricePoint>, min: &mut Option<PricePoint>) {
    let point = PricePoint {
        price: bar.close,
        time: bar.timestamp,
    };
    if max.map_or(true, |m| bar.close > m.price) {
        *max = Some(point);
    }
    if min.map_or(true, |m| bar.close < m.price) {
        *min = Some(point);
    }
}
