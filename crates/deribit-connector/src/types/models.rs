/*
[INPUT]:  Book levels from exchange payloads
[OUTPUT]: Typed price levels with decimal precision
[POS]:    Data layer - value types shared by canonical messages
[UPDATE]: When level shapes or numeric encodings change
*/

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `(price, amount)` book level. An amount of zero removes the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
    #[serde(with = "rust_decimal::serde::str")] pub Decimal,
);

impl PriceLevel {
    pub fn new(price: Decimal, amount: Decimal) -> Self {
        Self(price, amount)
    }

    pub fn price(&self) -> Decimal {
        self.0
    }

    pub fn amount(&self) -> Decimal {
        self.1
    }

    pub fn is_removal(&self) -> bool {
        self.1.is_zero()
    }
}

/// Read a decimal from a JSON number or numeric string.
pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => parse_decimal(raw.trim()),
        Value::Number(number) => parse_decimal(&number.to_string()),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
