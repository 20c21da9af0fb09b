/*
[INPUT]:  Exchange wire strings and platform state names
[OUTPUT]: Typed Rust enums with serialization support and strict parsing
[POS]:    Data layer - closed enumerations shared across the connector
[UPDATE]: When the exchange adds states, sides or event types
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DIFF_EVENT_TYPE, SIDE_BUY, SIDE_SELL, TRADE_EVENT_TYPE};
use crate::error::DeribitError;

/// Trade direction as sent by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => SIDE_BUY,
            Side::Sell => SIDE_SELL,
        }
    }
}

impl FromStr for Side {
    type Err = DeribitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            SIDE_BUY => Ok(Side::Buy),
            SIDE_SELL => Ok(Side::Sell),
            other => Err(DeribitError::UnknownDirection {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical trade side carried by trade messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// Numeric code used by the platform's order book messages
    pub fn code(&self) -> u8 {
        match self {
            TradeType::Buy => 1,
            TradeType::Sell => 2,
        }
    }
}

impl From<Side> for TradeType {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => TradeType::Buy,
            Side::Sell => TradeType::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled
    #[serde(rename = "GTC")]
    Gtc,
    /// Immediate or cancel
    #[serde(rename = "IOC")]
    Ioc,
    /// Fill or kill
    #[serde(rename = "FOK")]
    Fok,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
        }
    }
}

/// Platform order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    PendingCreate,
    Open,
    PartiallyFilled,
    Filled,
    Canceled,
    Failed,
}

impl OrderState {
    /// Returns true for terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Filled | OrderState::Canceled | OrderState::Failed
        )
    }
}

/// Order status strings reported by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeOrderStatus {
    Pending,
    New,
    Filled,
    PartiallyFilled,
    PendingCancel,
    Canceled,
    Rejected,
    Expired,
}

impl ExchangeOrderStatus {
    pub const ALL: [ExchangeOrderStatus; 8] = [
        ExchangeOrderStatus::Pending,
        ExchangeOrderStatus::New,
        ExchangeOrderStatus::Filled,
        ExchangeOrderStatus::PartiallyFilled,
        ExchangeOrderStatus::PendingCancel,
        ExchangeOrderStatus::Canceled,
        ExchangeOrderStatus::Rejected,
        ExchangeOrderStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeOrderStatus::Pending => "PENDING",
            ExchangeOrderStatus::New => "NEW",
            ExchangeOrderStatus::Filled => "FILLED",
            ExchangeOrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            ExchangeOrderStatus::PendingCancel => "PENDING_CANCEL",
            ExchangeOrderStatus::Canceled => "CANCELED",
            ExchangeOrderStatus::Rejected => "REJECTED",
            ExchangeOrderStatus::Expired => "EXPIRED",
        }
    }

    /// Canonical state for this exchange status
    pub fn order_state(&self) -> OrderState {
        match self {
            ExchangeOrderStatus::Pending => OrderState::PendingCreate,
            ExchangeOrderStatus::New => OrderState::Open,
            ExchangeOrderStatus::Filled => OrderState::Filled,
            ExchangeOrderStatus::PartiallyFilled => OrderState::PartiallyFilled,
            // cancel not yet confirmed, order still rests on the book
            ExchangeOrderStatus::PendingCancel => OrderState::Open,
            ExchangeOrderStatus::Canceled => OrderState::Canceled,
            ExchangeOrderStatus::Rejected | ExchangeOrderStatus::Expired => OrderState::Failed,
        }
    }
}

impl FromStr for ExchangeOrderStatus {
    type Err = DeribitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| DeribitError::UnknownOrderState {
                value: value.to_string(),
            })
    }
}

/// Map an exchange order status string onto the platform order state.
pub fn order_state_from_exchange(value: &str) -> Result<OrderState, DeribitError> {
    value
        .parse::<ExchangeOrderStatus>()
        .map(|status| status.order_state())
}

/// Websocket event kinds routed to the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventType {
    Diff,
    Trade,
}

impl StreamEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEventType::Diff => DIFF_EVENT_TYPE,
            StreamEventType::Trade => TRADE_EVENT_TYPE,
        }
    }
}

impl FromStr for StreamEventType {
    type Err = DeribitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            DIFF_EVENT_TYPE => Ok(StreamEventType::Diff),
            TRADE_EVENT_TYPE => Ok(StreamEventType::Trade),
            other => Err(DeribitError::UnknownEventType {
                value: other.to_string(),
            }),
        }
    }
}
