/*
[INPUT]:  Deribit API documentation and connector conventions
[OUTPUT]: Endpoint paths, URL templates, limit ids and protocol constants
[POS]:    Constants layer - shared by rate limits, config and normalizer
[UPDATE]: When endpoints, limits or protocol names change
*/

use std::time::Duration;

use url::Url;

use crate::error::Result;

pub const DEFAULT_DOMAIN: &str = "com";

pub const HBOT_ORDER_ID_PREFIX: &str = "x-XEKWYICX";
pub const MAX_ORDER_ID_LEN: usize = 36;

/// Base URL templates, `{}` is replaced with the domain tag
pub const REST_URL: &str = "https://api.deribit.{}/api/";
pub const WSS_URL: &str = "wss://stream.deribit.{}:9443/ws";

pub const PUBLIC_API_VERSION: &str = "v2";
pub const PRIVATE_API_VERSION: &str = "v2";

// Public endpoints
pub const TICKER_PRICE_CHANGE_PATH_URL: &str = "/public/ticker";
// TODO: confirm against the public/get_instrument docs before wiring a REST call to it
pub const EXCHANGE_INFO_PATH_URL: &str = "/public/get_instrument";
pub const PING_PATH_URL: &str = "/public/test";
// Kept exactly as registered upstream; the duplicated segment is unconfirmed.
pub const SNAPSHOT_PATH_URL: &str = "/public/get_order_book/public/get_order_book";
pub const SERVER_TIME_PATH_URL: &str = "/public/get_time";

// Private endpoints
pub const ACCOUNTS_PATH_URL: &str = "/private/get_account_summary";
pub const MY_TRADES_PATH_URL: &str = "/private/get_block_trade";
pub const ORDER_PATH_URL: &str = "/private/";
pub const ORDER_BUY_PATH_URL: &str = "/private/buy";
pub const ORDER_SELL_PATH_URL: &str = "/private/sell";
pub const DERIBIT_USER_STREAM_PATH_URL: &str = "private/list_api_keys";

pub const WS_HEARTBEAT_TIME_INTERVAL: Duration = Duration::from_secs(30);

pub const SIDE_BUY: &str = "buy";
pub const SIDE_SELL: &str = "sell";

// Rate limit pools
pub const REQUEST_WEIGHT: &str = "REQUEST_WEIGHT";
pub const ORDERS: &str = "ORDERS";
pub const ORDERS_24HR: &str = "ORDERS_24HR";

pub const ONE_SECOND: Duration = Duration::from_secs(1);
pub const ONE_MINUTE: Duration = Duration::from_secs(60);
pub const ONE_DAY: Duration = Duration::from_secs(86_400);

pub const MAX_REQUEST: u32 = 5000;

// Websocket event types
pub const DIFF_EVENT_TYPE: &str = "depthUpdate";
pub const TRADE_EVENT_TYPE: &str = "trade";

/// Map a request path onto the rate limit id that governs it.
///
/// Buy and sell placement share the `/private/` order bucket; every other path
/// is its own limit id.
pub fn order_limit_id(path: &str) -> &str {
    match path {
        ORDER_BUY_PATH_URL | ORDER_SELL_PATH_URL => ORDER_PATH_URL,
        other => other,
    }
}

/// REST base URL for a domain, e.g. `https://api.deribit.com/api/`
pub fn rest_base_url(domain: &str) -> Result<Url> {
    Ok(Url::parse(&REST_URL.replace("{}", domain))?)
}

/// Full URL of a public endpoint
pub fn public_rest_url(path: &str, domain: &str) -> Result<Url> {
    versioned_url(PUBLIC_API_VERSION, path, domain)
}

/// Full URL of a private endpoint
pub fn private_rest_url(path: &str, domain: &str) -> Result<Url> {
    versioned_url(PRIVATE_API_VERSION, path, domain)
}

/// Websocket URL for a domain
pub fn wss_url(domain: &str) -> Result<Url> {
    Ok(Url::parse(&WSS_URL.replace("{}", domain))?)
}

fn versioned_url(version: &str, path: &str, domain: &str) -> Result<Url> {
    let base = rest_base_url(domain)?.join(&format!("{version}/"))?;
    Ok(base.join(path.trim_start_matches('/'))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_rest_url_default_domain() {
        let url = public_rest_url(TICKER_PRICE_CHANGE_PATH_URL, DEFAULT_DOMAIN).unwrap();
        assert_eq!(url.as_str(), "https://api.deribit.com/api/v2/public/ticker");
    }

    #[test]
    fn test_private_rest_url_without_leading_slash() {
        let url = private_rest_url(DERIBIT_USER_STREAM_PATH_URL, DEFAULT_DOMAIN).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.deribit.com/api/v2/private/list_api_keys"
        );
    }

    #[test]
    fn test_wss_url_keeps_port() {
        let url = wss_url("us").unwrap();
        assert_eq!(url.as_str(), "wss://stream.deribit.us:9443/ws");
        assert_eq!(url.port(), Some(9443));
    }

    #[test]
    fn test_order_paths_share_limit_id() {
        assert_eq!(order_limit_id(ORDER_BUY_PATH_URL), ORDER_PATH_URL);
        assert_eq!(order_limit_id(ORDER_SELL_PATH_URL), ORDER_PATH_URL);
        assert_eq!(order_limit_id(PING_PATH_URL), PING_PATH_URL);
    }
}
