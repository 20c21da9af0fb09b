/*
[INPUT]:  Normalized fields extracted from exchange payloads
[OUTPUT]: Canonical order book messages (snapshot, diff, trade)
[POS]:    Data layer - exchange-neutral message format for book consumers
[UPDATE]: When the canonical message contract changes
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::TradeType;
use super::models::PriceLevel;

/// Full order book state at `update_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub trading_pair: String,
    pub update_id: i64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: f64,
}

/// Book changes covering `first_update_id..=update_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffMessage {
    pub trading_pair: String,
    pub first_update_id: i64,
    pub update_id: i64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    /// Left empty when the caller did not supply one
    pub timestamp: Option<f64>,
}

impl DiffMessage {
    /// True when this diff directly follows a message ending at `prev_update_id`.
    ///
    /// Checks `first_update_id == prev_update_id + 1`. A live Deribit book stream
    /// sets `prev_change_id` equal to the previous `change_id`, so diffs built
    /// from it fail this check; compare `first_update_id` against the previous
    /// `update_id` directly to follow such a stream.
    pub fn is_continuation_of(&self, prev_update_id: i64) -> bool {
        prev_update_id.checked_add(1) == Some(self.first_update_id)
    }
}

/// A single public trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub trading_pair: String,
    pub trade_type: TradeType,
    pub trade_id: String,
    /// Exchange timestamp in milliseconds, used as an ordering token within the trade stream
    pub update_id: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub timestamp: f64,
}

impl TradeMessage {
    pub fn exchange_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.update_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookMessageType {
    Snapshot,
    Diff,
    Trade,
}

/// Canonical order book message consumed by book reconstruction and trade feeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderBookMessage {
    Snapshot(SnapshotMessage),
    Diff(DiffMessage),
    Trade(TradeMessage),
}

impl OrderBookMessage {
    pub fn message_type(&self) -> OrderBookMessageType {
        match self {
            OrderBookMessage::Snapshot(_) => OrderBookMessageType::Snapshot,
            OrderBookMessage::Diff(_) => OrderBookMessageType::Diff,
            OrderBookMessage::Trade(_) => OrderBookMessageType::Trade,
        }
    }

    pub fn trading_pair(&self) -> &str {
        match self {
            OrderBookMessage::Snapshot(msg) => &msg.trading_pair,
            OrderBookMessage::Diff(msg) => &msg.trading_pair,
            OrderBookMessage::Trade(msg) => &msg.trading_pair,
        }
    }

    pub fn timestamp(&self) -> Option<f64> {
        match self {
            OrderBookMessage::Snapshot(msg) => Some(msg.timestamp),
            OrderBookMessage::Diff(msg) => msg.timestamp,
            OrderBookMessage::Trade(msg) => Some(msg.timestamp),
        }
    }

    pub fn update_id(&self) -> i64 {
        match self {
            OrderBookMessage::Snapshot(msg) => msg.update_id,
            OrderBookMessage::Diff(msg) => msg.update_id,
            OrderBookMessage::Trade(msg) => msg.update_id,
        }
    }

    /// Start of the sequence range; equals `update_id` for snapshots and trades
    pub fn first_update_id(&self) -> i64 {
        match self {
            OrderBookMessage::Diff(msg) => msg.first_update_id,
            other => other.update_id(),
        }
    }

    pub fn as_snapshot(&self) -> Option<&SnapshotMessage> {
        match self {
            OrderBookMessage::Snapshot(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_diff(&self) -> Option<&DiffMessage> {
        match self {
            OrderBookMessage::Diff(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_trade(&self) -> Option<&TradeMessage> {
        match self {
            OrderBookMessage::Trade(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(first: i64, last: i64) -> DiffMessage {
        DiffMessage {
            trading_pair: "BTC-PERPETUAL".to_string(),
            first_update_id: first,
            update_id: last,
            bids: Vec::new(),
            asks: Vec::new(),
            timestamp: None,
        }
    }

    #[test]
    fn continuation_requires_next_id() {
        let msg = diff(1002, 1005);
        assert!(msg.is_continuation_of(1001));
        assert!(!msg.is_continuation_of(1000));
        assert!(!diff(0, 1).is_continuation_of(i64::MAX));
    }

    #[test]
    fn accessors_cover_diff_without_timestamp() {
        let msg = OrderBookMessage::Diff(diff(7, 9));
        assert_eq!(msg.message_type(), OrderBookMessageType::Diff);
        assert_eq!(msg.first_update_id(), 7);
        assert_eq!(msg.update_id(), 9);
        assert_eq!(msg.timestamp(), None);
        assert!(msg.as_snapshot().is_none());
    }

    #[test]
    fn message_is_tagged_by_type() {
        let msg = OrderBookMessage::Diff(diff(1, 2));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!("diff"));
        assert_eq!(value["first_update_id"], json!(1));
    }

    #[test]
    fn trade_exchange_time_from_millis() {
        let trade = TradeMessage {
            trading_pair: "BTC-PERPETUAL".to_string(),
            trade_type: TradeType::Buy,
            trade_id: "1".to_string(),
            update_id: 1_700_000_000_123,
            price: Decimal::ONE,
            amount: Decimal::ONE,
            timestamp: 1_700_000_000.123,
        };
        let time = trade.exchange_time().unwrap();
        assert_eq!(time.timestamp_millis(), 1_700_000_000_123);
    }
}
