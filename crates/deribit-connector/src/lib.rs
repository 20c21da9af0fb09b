/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Deribit connector crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod config;
pub mod constants;
pub mod error;
pub mod order_book;
pub mod rate_limit;
pub mod types;
pub mod utils;

pub use config::{ConnectorConfig, Credentials, DomainConfig, FeeSchedule};

pub use error::{DeribitError, Result};

// Re-export the normalizer entry points
pub use order_book::{
    diff_from_exchange,
    snapshot_from_exchange,
    trade_from_exchange,
    trades_from_exchange,
};

pub use rate_limit::{LinkedLimitWeightPair, RateLimit, RateLimitTable, Throttler};

// Re-export all types
pub use types::*;
