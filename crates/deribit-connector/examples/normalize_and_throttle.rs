/*
[INPUT]:  Sample Deribit payloads and the default domain configuration
[OUTPUT]: Canonical messages and throttled request admissions on stdout
[POS]:    Examples - normalizer and rate limit walkthrough
[UPDATE]: When the public normalizer or throttler API changes
*/

use std::sync::Arc;

use deribit_connector::constants::{ORDER_PATH_URL, ORDERS, SNAPSHOT_PATH_URL};
use deribit_connector::*;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ConnectorConfig::from_yaml_str("domain: com\n")?;
    let domain = config.domain_config()?;
    let rest_url = domain.public_rest_url(SNAPSHOT_PATH_URL)?;
    let wss_url = domain.wss_url()?;
    info!(rest = %rest_url, wss = %wss_url, "domain selected");

    let snapshot = snapshot_from_exchange(
        &json!({
            "instrument_name": "BTC-PERPETUAL",
            "change_id": 1001,
            "bids": [[50000, 10]],
            "asks": [[50010, 5]]
        }),
        1_700_000_000.0,
        None,
    )?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let trade = trade_from_exchange(
        &json!({
            "instrument_name": "BTC-PERPETUAL",
            "direction": "sell",
            "trade_id": "77",
            "price": 50005,
            "amount": 2,
            "timestamp": 1_700_000_000_123i64
        }),
        None,
    )?;
    println!("{}", serde_json::to_string_pretty(&trade)?);

    if let Err(err) = trade_from_exchange(&json!({"direction": "hold"}), None) {
        println!("rejected: {err}");
    }

    let table = Arc::new(RateLimitTable::deribit()?);
    let throttler = Throttler::new(table);
    for n in 0..12 {
        throttler.acquire(ORDER_PATH_URL).await?;
        info!(n, orders_left = throttler.available(ORDERS)?, "order admitted");
    }

    Ok(())
}
