/*
[INPUT]:  Validated rate limit table and outbound request limit ids
[OUTPUT]: Admission permits applied atomically across every linked pool
[POS]:    Rate limit layer - in-process enforcement of the policy table
[UPDATE]: When admission order or window semantics change
*/

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use super::table::{RateLimit, RateLimitTable};
use crate::error::{DeribitError, Result};

type UsageLog = VecDeque<(Instant, u32)>;

/// Sliding-window throttler over a [`RateLimitTable`].
///
/// A call is admitted only when every pool it debits has room; all debits are
/// then recorded under one lock. Callers waiting on the same pool are admitted
/// in arrival order, while calls whose pools have room pass straight through.
#[derive(Debug)]
pub struct Throttler {
    table: Arc<RateLimitTable>,
    state: Mutex<ThrottlerState>,
    released: Notify,
}

#[derive(Debug, Default)]
struct ThrottlerState {
    logs: HashMap<String, UsageLog>,
    /// Tickets of callers waiting on each pool, oldest first
    queues: HashMap<String, BTreeSet<u64>>,
    next_ticket: u64,
}

enum Admission {
    Admitted,
    /// Blocked; `Some` when a window must roll over, `None` when queued behind an earlier caller
    Wait(Option<Duration>),
}

/// Removes a waiter from every pool queue when its `acquire` finishes or is dropped.
struct Ticket<'a> {
    throttler: &'a Throttler,
    id: u64,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let removed = self.throttler.state.lock().dequeue(self.id);
        if removed {
            self.throttler.released.notify_waiters();
        }
    }
}

impl Throttler {
    pub fn new(table: Arc<RateLimitTable>) -> Self {
        Self {
            table,
            state: Mutex::new(ThrottlerState::default()),
            released: Notify::new(),
        }
    }

    pub fn table(&self) -> &RateLimitTable {
        &self.table
    }

    /// Wait until a call against `limit_id` fits every linked pool, then debit them.
    pub async fn acquire(&self, limit_id: &str) -> Result<()> {
        let debits = self.debits_for(limit_id)?;
        let ticket = Ticket {
            throttler: self,
            id: self.state.lock().issue_ticket(),
        };

        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            let admission = self
                .state
                .lock()
                .admit(ticket.id, &debits, Instant::now(), true);
            match admission {
                Admission::Admitted => {
                    self.released.notify_waiters();
                    return Ok(());
                }
                Admission::Wait(Some(wait)) => {
                    debug!(limit_id, ?wait, "rate limit reached, deferring request");
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = released.as_mut() => {}
                    }
                }
                Admission::Wait(None) => {
                    debug!(limit_id, "queued behind earlier request");
                    released.await;
                }
            }
        }
    }

    /// Debit without waiting. Returns `false`, debiting nothing, when any pool is
    /// full or already has callers waiting on it.
    pub fn try_acquire(&self, limit_id: &str) -> Result<bool> {
        let debits = self.debits_for(limit_id)?;
        let mut state = self.state.lock();
        let ticket = state.issue_ticket();
        Ok(matches!(
            state.admit(ticket, &debits, Instant::now(), false),
            Admission::Admitted
        ))
    }

    /// Units left in `limit_id`'s own window.
    pub fn available(&self, limit_id: &str) -> Result<u32> {
        let limit = self
            .table
            .get(limit_id)
            .ok_or_else(|| DeribitError::UnknownEndpoint {
                limit_id: limit_id.to_string(),
            })?;
        let now = Instant::now();
        let mut state = self.state.lock();
        let used = match state.logs.get_mut(limit_id) {
            Some(log) => {
                prune(log, limit.time_interval, now);
                used(log)
            }
            None => 0,
        };
        Ok(limit.limit.saturating_sub(used))
    }

    /// Number of callers currently waiting on `limit_id`.
    pub fn waiting(&self, limit_id: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(limit_id)
            .map_or(0, BTreeSet::len)
    }

    /// Resolved debits merged per pool, so a pool linked twice is checked once.
    fn debits_for(&self, limit_id: &str) -> Result<Vec<(&RateLimit, u32)>> {
        let resolved = self.table.resolve(limit_id)?;
        let mut merged: Vec<(&RateLimit, u32)> = Vec::new();
        for debit in resolved.debits() {
            match merged
                .iter_mut()
                .find(|(limit, _)| limit.limit_id == debit.limit.limit_id)
            {
                Some((_, weight)) => *weight = weight.saturating_add(debit.weight),
                None => merged.push((debit.limit, debit.weight)),
            }
        }
        Ok(merged)
    }
}

impl ThrottlerState {
    fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        ticket
    }

    /// Commit every debit, or commit nothing and report why the caller must wait.
    ///
    /// A caller is blocked on a pool when the pool lacks room or an older ticket
    /// is already waiting on it. With `enqueue`, the ticket joins the queue of each
    /// pool that blocks it.
    fn admit(
        &mut self,
        ticket: u64,
        debits: &[(&RateLimit, u32)],
        now: Instant,
        enqueue: bool,
    ) -> Admission {
        let mut blocked = false;
        let mut wait: Option<Duration> = None;

        for (limit, weight) in debits {
            let log = self.logs.entry(limit.limit_id.clone()).or_default();
            prune(log, limit.time_interval, now);
            let needed = wait_for_room(log, limit, *weight, now);
            let behind = self
                .queues
                .get(&limit.limit_id)
                .and_then(|queue| queue.first())
                .is_some_and(|&head| head < ticket);

            if let Some(needed) = needed {
                wait = Some(wait.map_or(needed, |current| current.max(needed)));
            }
            if needed.is_some() || behind {
                blocked = true;
                if enqueue {
                    self.queues
                        .entry(limit.limit_id.clone())
                        .or_default()
                        .insert(ticket);
                }
            }
        }

        if blocked {
            return Admission::Wait(wait);
        }
        for (limit, weight) in debits {
            self.logs
                .entry(limit.limit_id.clone())
                .or_default()
                .push_back((now, *weight));
        }
        self.dequeue(ticket);
        Admission::Admitted
    }

    fn dequeue(&mut self, ticket: u64) -> bool {
        let mut removed = false;
        self.queues.retain(|_, queue| {
            removed |= queue.remove(&ticket);
            !queue.is_empty()
        });
        removed
    }
}

fn prune(log: &mut UsageLog, window: Duration, now: Instant) {
    while let Some(&(at, _)) = log.front() {
        if now.saturating_duration_since(at) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

fn used(log: &UsageLog) -> u32 {
    log.iter().fold(0u32, |total, (_, weight)| total.saturating_add(*weight))
}

/// Time until enough old entries leave the window to fit `weight` more units.
fn wait_for_room(log: &UsageLog, limit: &RateLimit, weight: u32, now: Instant) -> Option<Duration> {
    let used = used(log);
    let overflow = used.saturating_add(weight).checked_sub(limit.limit)?;
    if overflow == 0 {
        return None;
    }

    let mut freed = 0u32;
    for (at, entry_weight) in log {
        freed = freed.saturating_add(*entry_weight);
        if freed >= overflow {
            return Some((*at + limit.time_interval).saturating_duration_since(now));
        }
    }
    // combined weight above capacity; table validation rejects such tables
    Some(limit.time_interval)
}
