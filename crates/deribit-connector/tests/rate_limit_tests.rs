/*
[INPUT]:  Deribit rate limit table and throttled request sequences
[OUTPUT]: Test results for weight resolution and admission
[POS]:    Integration tests - rate limit policy table and throttler
[UPDATE]: When limits, weights or admission semantics change
*/

use std::sync::Arc;
use std::time::Duration;

use deribit_connector::constants::{
    self, ORDER_BUY_PATH_URL, ORDER_PATH_URL, ORDER_SELL_PATH_URL, ORDERS, ORDERS_24HR,
    REQUEST_WEIGHT, TICKER_PRICE_CHANGE_PATH_URL,
};
use deribit_connector::{DeribitError, LinkedLimitWeightPair, RateLimit, RateLimitTable, Throttler};
use rstest::rstest;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn deribit_table() -> RateLimitTable {
    assert_ok!(RateLimitTable::deribit())
}

#[test]
fn test_order_placement_debits_three_pools() {
    let table = deribit_table();
    let resolved = assert_ok!(table.resolve(ORDER_PATH_URL));

    assert_eq!(resolved.own.limit, 5000);
    assert_eq!(resolved.own.time_interval, Duration::from_secs(60));
    assert_eq!(resolved.linked.len(), 3);
    assert_eq!(resolved.linked_weight(REQUEST_WEIGHT), Some(1));
    assert_eq!(resolved.linked_weight(ORDERS), Some(1));
    assert_eq!(resolved.linked_weight(ORDERS_24HR), Some(1));
}

#[test]
fn test_ticker_debits_global_weight_only() {
    let table = deribit_table();
    let resolved = assert_ok!(table.resolve(TICKER_PRICE_CHANGE_PATH_URL));

    assert_eq!(resolved.linked.len(), 1);
    assert_eq!(resolved.linked[0].limit.limit_id, REQUEST_WEIGHT);
    assert_eq!(resolved.linked[0].weight, 40);
    assert_eq!(resolved.debits().count(), 2);
}

#[rstest]
#[case(REQUEST_WEIGHT, 1200, 60)]
#[case(ORDERS, 10, 1)]
#[case(ORDERS_24HR, 100_000, 86_400)]
fn test_pool_capacities(#[case] pool: &str, #[case] capacity: u32, #[case] window_secs: u64) {
    let table = deribit_table();
    let limit = table.get(pool).expect("pool defined");

    assert_eq!(limit.limit, capacity);
    assert_eq!(limit.time_interval, Duration::from_secs(window_secs));
    assert!(limit.linked_limits.is_empty());
}

#[rstest]
#[case(constants::EXCHANGE_INFO_PATH_URL, 10)]
#[case(constants::SNAPSHOT_PATH_URL, 50)]
#[case(constants::DERIBIT_USER_STREAM_PATH_URL, 1)]
#[case(constants::SERVER_TIME_PATH_URL, 1)]
#[case(constants::PING_PATH_URL, 1)]
#[case(constants::ACCOUNTS_PATH_URL, 10)]
#[case(constants::MY_TRADES_PATH_URL, 10)]
fn test_endpoint_weights(#[case] endpoint: &str, #[case] weight: u32) {
    let table = deribit_table();
    let resolved = assert_ok!(table.resolve(endpoint));

    assert_eq!(resolved.own.limit, 5000);
    assert_eq!(resolved.linked.len(), 1);
    assert_eq!(resolved.linked_weight(REQUEST_WEIGHT), Some(weight));
}

#[test]
fn test_buy_and_sell_share_order_bucket() {
    let table = deribit_table();
    for path in [ORDER_BUY_PATH_URL, ORDER_SELL_PATH_URL] {
        let resolved = assert_ok!(table.resolve(constants::order_limit_id(path)));
        assert_eq!(resolved.own.limit_id, ORDER_PATH_URL);
    }
}

#[test]
fn test_unknown_endpoint_is_not_defaulted() {
    let table = deribit_table();

    let err = assert_err!(table.resolve("/private/buy"));

    assert!(matches!(err, DeribitError::UnknownEndpoint { ref limit_id } if limit_id == "/private/buy"));
    assert!(err.is_config_error());
}

#[test]
fn test_ensure_endpoints_at_startup() {
    let table = deribit_table();

    assert_ok!(table.ensure_endpoints([ORDER_PATH_URL, TICKER_PRICE_CHANGE_PATH_URL]));
    assert_err!(table.ensure_endpoints([ORDER_PATH_URL, "/public/get_index"]));
}

#[test]
fn test_pool_linked_twice_is_validated_on_combined_weight() {
    let mut limits = deribit_connector::rate_limit::deribit_rate_limits();
    limits.push(RateLimit::pool("/private/edit", 5000, Duration::from_secs(60)).with_linked_limits(vec![
        LinkedLimitWeightPair::new(ORDERS, 6),
        LinkedLimitWeightPair::new(ORDERS, 6),
    ]));

    let err = assert_err!(RateLimitTable::new(limits));

    assert!(matches!(err, DeribitError::InvalidRateLimit { ref limit_id, .. } if limit_id == "/private/edit"));
    assert!(err.to_string().contains("weight 12 exceeds capacity 10"));
}

#[tokio::test(start_paused = true)]
async fn test_order_pool_limits_per_second() {
    let throttler = Throttler::new(Arc::new(deribit_table()));

    for _ in 0..10 {
        assert!(assert_ok!(throttler.try_acquire(ORDER_PATH_URL)));
    }
    assert!(!assert_ok!(throttler.try_acquire(ORDER_PATH_URL)));
    assert_eq!(assert_ok!(throttler.available(ORDERS)), 0);
    assert_eq!(assert_ok!(throttler.available(REQUEST_WEIGHT)), 1190);

    // ping does not touch the order pools
    assert!(assert_ok!(throttler.try_acquire(constants::PING_PATH_URL)));

    let start = Instant::now();
    assert_ok!(throttler.acquire(ORDER_PATH_URL).await);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
    assert_eq!(assert_ok!(throttler.available(ORDERS_24HR)), 100_000 - 11);
}

#[tokio::test(start_paused = true)]
async fn test_global_weight_blocks_all_endpoints() {
    let throttler = Throttler::new(Arc::new(deribit_table()));

    // 24 snapshot calls at weight 50 use the whole 1200 budget
    for _ in 0..24 {
        assert!(assert_ok!(throttler.try_acquire(constants::SNAPSHOT_PATH_URL)));
    }
    assert!(!assert_ok!(throttler.try_acquire(constants::PING_PATH_URL)));
    assert!(!assert_ok!(throttler.try_acquire(ORDER_PATH_URL)));
    assert_eq!(assert_ok!(throttler.available(ORDERS)), 10);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_admitted_in_order() {
    let throttler = Arc::new(Throttler::new(Arc::new(deribit_table())));
    for _ in 0..10 {
        assert_ok!(throttler.acquire(ORDER_PATH_URL).await);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    for caller in 0..3 {
        let throttler = throttler.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            throttler
                .acquire(ORDER_PATH_URL)
                .await
                .expect("acquire order permit");
            tx.send(caller).expect("receiver alive");
        });
        tokio::task::yield_now().await;
    }
    drop(tx);

    let mut admitted = Vec::new();
    while let Some(caller) = rx.recv().await {
        admitted.push(caller);
    }
    assert_eq!(admitted, vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_endpoint_not_blocked_by_order_waiter() {
    let throttler = Arc::new(Throttler::new(Arc::new(deribit_table())));
    for _ in 0..10 {
        assert_ok!(throttler.acquire(ORDER_PATH_URL).await);
    }

    let order = {
        let throttler = throttler.clone();
        tokio::spawn(async move { throttler.acquire(ORDER_PATH_URL).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(throttler.waiting(ORDERS), 1);

    let start = Instant::now();
    assert!(assert_ok!(throttler.try_acquire(constants::PING_PATH_URL)));
    assert_ok!(throttler.acquire(constants::PING_PATH_URL).await);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(assert_ok!(throttler.available(REQUEST_WEIGHT)), 1200 - 12);

    // the order call still holds its place in the order pool
    assert!(!assert_ok!(throttler.try_acquire(ORDER_PATH_URL)));
    assert_ok!(assert_ok!(order.await));
    assert_eq!(start.elapsed(), Duration::from_secs(1));
    assert_eq!(throttler.waiting(ORDERS), 0);
}
