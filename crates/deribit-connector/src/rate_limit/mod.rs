/*
[INPUT]:  Exchange request limits and outbound request limit ids
[OUTPUT]: Policy table lookups and throttled admission
[POS]:    Rate limit layer - declarative limits and their enforcement
[UPDATE]: When limits change or a new enforcement mode is added
*/

pub mod table;
pub mod throttler;

pub use table::{
    deribit_rate_limits, Debit, LinkedLimitWeightPair, RateLimit, RateLimitTable, ResolvedLimits,
};
pub use throttler::Throttler;
