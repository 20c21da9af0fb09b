/*
[INPUT]:  Declarative rate limit entries (pools and per-endpoint buckets)
[OUTPUT]: Validated immutable policy table and per-endpoint debit sets
[POS]:    Rate limit layer - policy lookup and weight resolution
[UPDATE]: When exchange limits or endpoint weights change
*/

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::constants::{
    ACCOUNTS_PATH_URL, DERIBIT_USER_STREAM_PATH_URL, EXCHANGE_INFO_PATH_URL, MAX_REQUEST,
    MY_TRADES_PATH_URL, ONE_DAY, ONE_MINUTE, ONE_SECOND, ORDER_PATH_URL, ORDERS, ORDERS_24HR,
    PING_PATH_URL, REQUEST_WEIGHT, SERVER_TIME_PATH_URL, SNAPSHOT_PATH_URL,
    TICKER_PRICE_CHANGE_PATH_URL,
};
use crate::error::{DeribitError, Result};

/// One call against the owning limit consumes `weight` units of `limit_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedLimitWeightPair {
    pub limit_id: String,
    pub weight: u32,
}

impl LinkedLimitWeightPair {
    pub fn new(limit_id: impl Into<String>, weight: u32) -> Self {
        Self {
            limit_id: limit_id.into(),
            weight,
        }
    }
}

/// A capacity of `limit` units per `time_interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit_id: String,
    pub limit: u32,
    pub time_interval: Duration,
    pub linked_limits: Vec<LinkedLimitWeightPair>,
}

impl RateLimit {
    /// A shared pool with no links of its own.
    pub fn pool(limit_id: impl Into<String>, limit: u32, time_interval: Duration) -> Self {
        Self {
            limit_id: limit_id.into(),
            limit,
            time_interval,
            linked_limits: Vec::new(),
        }
    }

    pub fn with_linked_limits(mut self, linked_limits: Vec<LinkedLimitWeightPair>) -> Self {
        self.linked_limits = linked_limits;
        self
    }
}

/// A single debit applied when an endpoint is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debit<'a> {
    pub limit: &'a RateLimit,
    pub weight: u32,
}

/// All debits a call to one endpoint must apply together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLimits<'a> {
    /// The endpoint's own bucket, debited at weight 1
    pub own: &'a RateLimit,
    pub linked: Vec<Debit<'a>>,
}

impl<'a> ResolvedLimits<'a> {
    /// Own bucket first, then linked pools in declaration order.
    pub fn debits(&self) -> impl Iterator<Item = Debit<'a>> + '_ {
        std::iter::once(Debit {
            limit: self.own,
            weight: 1,
        })
        .chain(self.linked.iter().copied())
    }

    pub fn linked_weight(&self, limit_id: &str) -> Option<u32> {
        self.linked
            .iter()
            .find(|debit| debit.limit.limit_id == limit_id)
            .map(|debit| debit.weight)
    }
}

/// Immutable registry of rate limits, validated once at startup.
#[derive(Debug, Clone)]
pub struct RateLimitTable {
    limits: Vec<RateLimit>,
    index: HashMap<String, usize>,
}

impl RateLimitTable {
    pub fn new(limits: Vec<RateLimit>) -> Result<Self> {
        let mut index = HashMap::with_capacity(limits.len());
        for (position, limit) in limits.iter().enumerate() {
            if limit.limit == 0 {
                return Err(invalid(&limit.limit_id, "capacity must be positive"));
            }
            if limit.time_interval.is_zero() {
                return Err(invalid(&limit.limit_id, "time interval must be positive"));
            }
            if index.insert(limit.limit_id.clone(), position).is_some() {
                return Err(invalid(&limit.limit_id, "duplicate limit id"));
            }
        }

        let table = Self { limits, index };
        for limit in &table.limits {
            // a call debits its own bucket at weight 1 plus every link, summed per pool
            let mut combined: HashMap<&str, u32> = HashMap::new();
            combined.insert(limit.limit_id.as_str(), 1);
            for linked in &limit.linked_limits {
                if table.get(&linked.limit_id).is_none() {
                    return Err(invalid(
                        &limit.limit_id,
                        format!("linked pool `{}` is not defined", linked.limit_id),
                    ));
                }
                if linked.weight == 0 {
                    return Err(invalid(
                        &limit.limit_id,
                        format!("weight for `{}` must be positive", linked.limit_id),
                    ));
                }
                let total = combined.entry(linked.limit_id.as_str()).or_insert(0);
                *total = total.saturating_add(linked.weight);
            }
            for (pool_id, weight) in combined {
                let Some(pool) = table.get(pool_id) else {
                    continue;
                };
                if weight > pool.limit {
                    return Err(invalid(
                        &limit.limit_id,
                        format!(
                            "weight {} exceeds capacity {} of `{}`",
                            weight, pool.limit, pool.limit_id
                        ),
                    ));
                }
            }
        }
        Ok(table)
    }

    /// The Deribit REST policy table.
    pub fn deribit() -> Result<Self> {
        Self::new(deribit_rate_limits())
    }

    pub fn get(&self, limit_id: &str) -> Option<&RateLimit> {
        self.index.get(limit_id).map(|&position| &self.limits[position])
    }

    pub fn limits(&self) -> &[RateLimit] {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Every debit a call to `limit_id` must apply.
    pub fn resolve(&self, limit_id: &str) -> Result<ResolvedLimits<'_>> {
        let own = self.get(limit_id).ok_or_else(|| DeribitError::UnknownEndpoint {
            limit_id: limit_id.to_string(),
        })?;
        let linked = own
            .linked_limits
            .iter()
            .map(|pair| {
                // validated in `new`
                self.get(&pair.limit_id)
                    .map(|limit| Debit {
                        limit,
                        weight: pair.weight,
                    })
                    .ok_or_else(|| DeribitError::UnknownEndpoint {
                        limit_id: pair.limit_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ResolvedLimits { own, linked })
    }

    /// Fail fast if any endpoint the caller intends to use has no entry.
    pub fn ensure_endpoints<'a>(&self, limit_ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for limit_id in limit_ids {
            if self.get(limit_id).is_none() {
                warn!(limit_id, "endpoint has no rate limit entry");
                return Err(DeribitError::UnknownEndpoint {
                    limit_id: limit_id.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn invalid(limit_id: &str, reason: impl Into<String>) -> DeribitError {
    DeribitError::InvalidRateLimit {
        limit_id: limit_id.to_string(),
        reason: reason.into(),
    }
}

fn weighted(limit_id: &str, pairs: &[(&str, u32)]) -> RateLimit {
    RateLimit::pool(limit_id, MAX_REQUEST, ONE_MINUTE).with_linked_limits(
        pairs
            .iter()
            .map(|&(pool, weight)| LinkedLimitWeightPair::new(pool, weight))
            .collect(),
    )
}

/// Pools first, then per-endpoint buckets.
pub fn deribit_rate_limits() -> Vec<RateLimit> {
    vec![
        RateLimit::pool(REQUEST_WEIGHT, 1200, ONE_MINUTE),
        RateLimit::pool(ORDERS, 10, ONE_SECOND),
        RateLimit::pool(ORDERS_24HR, 100_000, ONE_DAY),
        weighted(TICKER_PRICE_CHANGE_PATH_URL, &[(REQUEST_WEIGHT, 40)]),
        weighted(EXCHANGE_INFO_PATH_URL, &[(REQUEST_WEIGHT, 10)]),
        weighted(SNAPSHOT_PATH_URL, &[(REQUEST_WEIGHT, 50)]),
        weighted(DERIBIT_USER_STREAM_PATH_URL, &[(REQUEST_WEIGHT, 1)]),
        weighted(SERVER_TIME_PATH_URL, &[(REQUEST_WEIGHT, 1)]),
        weighted(PING_PATH_URL, &[(REQUEST_WEIGHT, 1)]),
        weighted(ACCOUNTS_PATH_URL, &[(REQUEST_WEIGHT, 10)]),
        weighted(MY_TRADES_PATH_URL, &[(REQUEST_WEIGHT, 10)]),
        weighted(
            ORDER_PATH_URL,
            &[(REQUEST_WEIGHT, 1), (ORDERS, 1), (ORDERS_24HR, 1)],
        ),
    ]
}
