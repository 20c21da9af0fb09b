/*
[INPUT]:  Sample Deribit payload shapes
[OUTPUT]: Shared JSON fixtures for normalizer and rate limit tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new payload fixtures
*/

//! Common test utilities for deribit-connector tests

use serde_json::{json, Value};

/// `public/get_order_book` result for BTC-PERPETUAL
pub fn snapshot_payload() -> Value {
    json!({
        "instrument_name": "BTC-PERPETUAL",
        "change_id": 1001,
        "bids": [[50000, 10]],
        "asks": [[50010, 5]]
    })
}

/// `book.BTC-PERPETUAL.100ms` notification data
pub fn diff_payload() -> Value {
    json!({
        "type": "change",
        "instrument_name": "BTC-PERPETUAL",
        "timestamp": 1700000000500i64,
        "prev_change_id": 1001,
        "change_id": 1004,
        "bids": [["change", 50000, 12], ["delete", 49995, 0]],
        "asks": [["new", 50020, 1]]
    })
}

/// One element of a `trades.BTC-PERPETUAL.100ms` notification
pub fn trade_payload(direction: &str) -> Value {
    json!({
        "instrument_name": "BTC-PERPETUAL",
        "direction": direction,
        "trade_id": "77",
        "price": 50005,
        "amount": 2,
        "timestamp": 1700000000123i64
    })
}
