/*
[INPUT]:  Exchange instrument info, order side and trading pair
[OUTPUT]: Tradability checks and client order ids
[POS]:    Utility layer - small helpers used by the host's order path
[UPDATE]: When instrument filters or order id format change
*/

use serde_json::Value;
use uuid::Uuid;

use crate::constants::{HBOT_ORDER_ID_PREFIX, MAX_ORDER_ID_LEN};
use crate::types::Side;

/// Whether a trading pair is enabled for trading based on its exchange info.
pub fn is_exchange_information_valid(exchange_info: &Value) -> bool {
    let trading = exchange_info.get("status").and_then(Value::as_str) == Some("TRADING");
    let spot = exchange_info
        .get("permissions")
        .and_then(Value::as_array)
        .is_some_and(|permissions| permissions.iter().any(|p| p.as_str() == Some("SPOT")));
    trading && spot
}

/// Client order id: prefix, side marker, pair symbols, random suffix, capped at 36 chars.
pub fn new_client_order_id(side: Side, trading_pair: &str) -> String {
    let marker = match side {
        Side::Buy => 'B',
        Side::Sell => 'S',
    };
    let symbols: String = trading_pair
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let mut id = format!(
        "{HBOT_ORDER_ID_PREFIX}{marker}{symbols}{}",
        Uuid::new_v4().simple()
    );
    id.truncate(MAX_ORDER_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exchange_info_requires_trading_and_spot() {
        assert!(is_exchange_information_valid(&json!({
            "status": "TRADING",
            "permissions": ["MARGIN", "SPOT"]
        })));
        assert!(!is_exchange_information_valid(&json!({
            "status": "BREAK",
            "permissions": ["SPOT"]
        })));
        assert!(!is_exchange_information_valid(&json!({"status": "TRADING"})));
        assert!(!is_exchange_information_valid(&json!({})));
    }

    #[test]
    fn client_order_id_shape() {
        let id = new_client_order_id(Side::Sell, "BTC-PERPETUAL");
        assert_eq!(id.len(), MAX_ORDER_ID_LEN);
        assert!(id.starts_with("x-XEKWYICXSBTCPERPETUAL"));
    }

    #[test]
    fn client_order_ids_are_unique() {
        let first = new_client_order_id(Side::Buy, "ETH-USD");
        let second = new_client_order_id(Side::Buy, "ETH-USD");
        assert!(first.starts_with("x-XEKWYICXBETHUSD"));
        assert_ne!(first, second);
    }
}
