/*
[INPUT]:  Raw Deribit JSON payloads (book snapshots, book notifications, trades)
[OUTPUT]: Canonical OrderBookMessage values
[POS]:    Normalization layer - pure exchange-to-platform message translation
[UPDATE]: When exchange payload fields or the canonical format change
*/

//! Conversion of Deribit order book and trade payloads into [`OrderBookMessage`].
//!
//! Every function here is pure: the raw payload is never mutated, and a missing
//! or malformed required field fails the whole conversion with an error naming
//! the field. Nothing is defaulted.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DeribitError, Result};
use crate::types::models::decimal_from_json;
use crate::types::{
    DiffMessage, OrderBookMessage, PriceLevel, Side, SnapshotMessage, TradeMessage, TradeType,
};

/// Build a snapshot message from a `public/get_order_book` result.
///
/// `extra` fields are merged over `raw` before extraction, so callers can supply
/// context the payload lacks (for example the trading pair).
pub fn snapshot_from_exchange(
    raw: &Value,
    timestamp: f64,
    extra: Option<&Map<String, Value>>,
) -> Result<OrderBookMessage> {
    let msg = merged(raw, extra)?;
    Ok(OrderBookMessage::Snapshot(SnapshotMessage {
        trading_pair: string_field(&msg, "instrument_name")?,
        update_id: i64_field(&msg, "change_id")?,
        bids: levels_field(&msg, "bids")?,
        asks: levels_field(&msg, "asks")?,
        timestamp,
    }))
}

/// Build a diff message from a `book.*` subscription notification.
///
/// The range is `prev_change_id..change_id`; no timestamp is invented when the
/// caller passes `None`.
pub fn diff_from_exchange(
    raw: &Value,
    timestamp: Option<f64>,
    extra: Option<&Map<String, Value>>,
) -> Result<OrderBookMessage> {
    let msg = merged(raw, extra)?;
    Ok(OrderBookMessage::Diff(DiffMessage {
        trading_pair: string_field(&msg, "instrument_name")?,
        first_update_id: i64_field(&msg, "prev_change_id")?,
        update_id: i64_field(&msg, "change_id")?,
        bids: levels_field(&msg, "bids")?,
        asks: levels_field(&msg, "asks")?,
        timestamp,
    }))
}

/// Build a trade message from one element of a `trades.*` notification.
///
/// The exchange timestamp is in milliseconds: the message timestamp is that
/// value in seconds, and `update_id` keeps the raw millisecond value.
pub fn trade_from_exchange(
    raw: &Value,
    extra: Option<&Map<String, Value>>,
) -> Result<OrderBookMessage> {
    let msg = merged(raw, extra)?;
    let direction = string_field(&msg, "direction")?;
    let trade_type = TradeType::from(direction.parse::<Side>()?);
    let timestamp_ms = i64_field(&msg, "timestamp")?;

    Ok(OrderBookMessage::Trade(TradeMessage {
        trading_pair: string_field(&msg, "instrument_name")?,
        trade_type,
        trade_id: id_field(&msg, "trade_id")?,
        update_id: timestamp_ms,
        price: decimal_field(&msg, "price")?,
        amount: decimal_field(&msg, "amount")?,
        timestamp: timestamp_ms as f64 / 1000.0,
    }))
}

/// Normalize every trade of a `trades.*` notification.
///
/// Fails on the first malformed trade and returns nothing in that case.
pub fn trades_from_exchange(
    raw: &Value,
    extra: Option<&Map<String, Value>>,
) -> Result<Vec<OrderBookMessage>> {
    let trades = raw
        .as_array()
        .ok_or_else(|| DeribitError::invalid_payload(ROOT, "expected JSON array of trades"))?;

    trades
        .iter()
        .enumerate()
        .map(|(index, trade)| {
            trade_from_exchange(trade, extra).inspect_err(|err| {
                debug!(index, error = %err, "rejecting trade notification");
            })
        })
        .collect()
}

const ROOT: &str = "<root>";

fn merged<'a>(
    raw: &'a Value,
    extra: Option<&Map<String, Value>>,
) -> Result<Cow<'a, Map<String, Value>>> {
    let base = raw
        .as_object()
        .ok_or_else(|| DeribitError::invalid_payload(ROOT, "expected JSON object"))?;

    match extra {
        Some(extra) if !extra.is_empty() => {
            let mut owned = base.clone();
            for (key, value) in extra {
                owned.insert(key.clone(), value.clone());
            }
            Ok(Cow::Owned(owned))
        }
        _ => Ok(Cow::Borrowed(base)),
    }
}

fn required<'a>(msg: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    match msg.get(field) {
        Some(Value::Null) | None => Err(DeribitError::missing_field(field)),
        Some(value) => Ok(value),
    }
}

fn string_field(msg: &Map<String, Value>, field: &str) -> Result<String> {
    required(msg, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DeribitError::invalid_payload(field, "expected string"))
}

fn i64_field(msg: &Map<String, Value>, field: &str) -> Result<i64> {
    required(msg, field)?
        .as_i64()
        .ok_or_else(|| DeribitError::invalid_payload(field, "expected integer"))
}

fn decimal_field(msg: &Map<String, Value>, field: &str) -> Result<rust_decimal::Decimal> {
    decimal_from_json(required(msg, field)?)
        .ok_or_else(|| DeribitError::invalid_payload(field, "expected decimal number"))
}

/// Trade ids are strings on Deribit, integer ids are accepted and rendered as text.
fn id_field(msg: &Map<String, Value>, field: &str) -> Result<String> {
    match required(msg, field)? {
        Value::String(id) => Ok(id.clone()),
        Value::Number(id) if id.is_i64() || id.is_u64() => Ok(id.to_string()),
        _ => Err(DeribitError::invalid_payload(field, "expected string or integer id")),
    }
}

fn levels_field(msg: &Map<String, Value>, field: &str) -> Result<Vec<PriceLevel>> {
    let levels = required(msg, field)?
        .as_array()
        .ok_or_else(|| DeribitError::invalid_payload(field, "expected array of levels"))?;

    levels
        .iter()
        .enumerate()
        .map(|(index, level)| parse_level(level).map_err(|reason| {
            DeribitError::invalid_payload(format!("{field}[{index}]"), reason)
        }))
        .collect()
}

/// Accepts `[price, amount]` and `[action, price, amount]`.
fn parse_level(level: &Value) -> std::result::Result<PriceLevel, &'static str> {
    let parts = level.as_array().ok_or("expected level array")?;
    let (price, amount) = match parts.as_slice() {
        [price, amount] => (price, amount),
        [Value::String(_), price, amount] => (price, amount),
        _ => return Err("expected [price, amount] or [action, price, amount]"),
    };
    let price = decimal_from_json(price).ok_or("invalid price")?;
    let amount = decimal_from_json(amount).ok_or("invalid amount")?;
    Ok(PriceLevel::new(price, amount))
}
