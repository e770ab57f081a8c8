//! Free-text trade signal parser.
//!
//! Parsing is all-or-nothing: either every field is found and a [`Signal`]
//! comes back, or a single [`ParseError`] names the first field that was
//! missing.

pub mod fields;
pub mod timestamp;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::Signal;

/// Parse `text` against the current UTC clock.
pub fn parse(text: &str) -> Result<Signal, ParseError> {
    parse_at(text, Utc::now())
}

/// Parse `text`, rejecting signal times later than `now`.
pub fn parse_at(text: &str, now: DateTime<Utc>) -> Result<Signal, ParseError> {
    let pair = fields::extract_pair(text).ok_or(ParseError::MissingPair)?;
    let (direction, entry) = fields::extract_entry(text).ok_or(ParseError::MissingEntry)?;
    let stop_loss = fields::extract_stop_loss(text).ok_or(ParseError::MissingStopLoss)?;
    let take_profits =
        fields::extract_take_profits(text).ok_or(ParseError::MissingTakeProfits)?;
    let signal_time = timestamp::extract_time(text).ok_or(ParseError::MissingTime)?;

    if signal_time > now {
        return Err(ParseError::FutureTime { signal_time, now });
    }
    if stop_loss == entry {
        return Err(ParseError::StopLossEqualsEntry(stop_loss));
    }

    let signal = Signal {
        pair,
        direction,
        entry,
        stop_loss,
        take_profits,
        signal_time,
    };

    if !signal.stop_on_loss_side() {
        warn!(
            "Stop loss {} is on the profit side of a {} entry at {}",
            signal.stop_loss, signal.direction, signal.entry
        );
    }
    debug!("Parsed signal: {}", signal);

    Ok(signal)
}
