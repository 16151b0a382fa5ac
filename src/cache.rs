//! In-memory plan cache with single-flight computation
//!
//! Entries are keyed by request fingerprint. A key is either `Ready` with an expiry or
//! `Pending` while one caller (the leader) computes it; concurrent callers for the same
//! key wait on the leader's channel instead of fanning out again.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{Fingerprint, TripPlan};

/// How long plans stay fresh and how many are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Complete plans
    pub ttl: Duration,
    /// Usable but partial plans, so degraded answers are retried soon
    pub partial_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            partial_ttl: Duration::from_secs(config.partial_ttl_secs),
            max_entries: config.max_entries.max(1),
        }
    }
}

impl CachePolicy {
    /// TTL for a finished plan; `None` means it must not be stored
    #[must_use]
    pub fn ttl_for(&self, plan: &TripPlan) -> Option<Duration> {
        if plan.is_complete() {
            Some(self.ttl)
        } else if plan.is_usable() && !self.partial_ttl.is_zero() {
            Some(self.partial_ttl)
        } else {
            None
        }
    }
}

enum Slot {
    Ready {
        plan: TripPlan,
        expires_at: Instant,
    },
    Pending {
        flight: u64,
        rx: watch::Receiver<Option<TripPlan>>,
    },
}

enum Claim<'a> {
    Hit(TripPlan),
    Wait(watch::Receiver<Option<TripPlan>>),
    Lead(FlightGuard<'a>),
}

/// Held by the leader. Dropping it removes the pending slot before the channel closes,
/// so waiters that see the closed channel can claim the key again.
struct FlightGuard<'a> {
    cache: &'a TripCache,
    key: Fingerprint,
    flight: u64,
    tx: watch::Sender<Option<TripPlan>>,
}

impl FlightGuard<'_> {
    fn publish(&self, plan: TripPlan) {
        self.tx.send_replace(Some(plan));
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.entries.remove_if(&self.key, |_, slot| {
            matches!(slot, Slot::Pending { flight, .. } if *flight == self.flight)
        });
    }
}

pub struct TripCache {
    entries: DashMap<Fingerprint, Slot>,
    policy: CachePolicy,
    next_flight: AtomicU64,
}

impl TripCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
            next_flight: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Fresh plan for `key`, if any. Expired entries are dropped on the way.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self), fields(key = %key))]
    pub fn get(&self, key: &Fingerprint) -> Option<TripPlan> {
        let now = Instant::now();
        let expired = match self.entries.get(key).as_deref() {
            Some(Slot::Ready { plan, expires_at }) if *expires_at > now => {
                debug!("Key found and still fresh");
                return Some(plan.clone());
            }
            Some(Slot::Ready { .. }) => true,
            Some(Slot::Pending { .. }) | None => false,
        };

        if expired {
            debug!("Key found but expired");
            self.remove_expired(key, now);
        } else {
            debug!("Key not found");
        }
        None
    }

    /// Store a plan for `ttl`, evicting if the cache is full. Only stored plans count
    /// towards `max_entries`; in-flight computations do not.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, plan), fields(key = %key))]
    pub fn put(&self, key: Fingerprint, plan: TripPlan, ttl: Duration) {
        let replacing = matches!(self.entries.get(&key).as_deref(), Some(Slot::Ready { .. }));
        if !replacing && self.len() >= self.policy.max_entries {
            self.make_room();
        }
        self.entries.insert(
            key,
            Slot::Ready {
                plan,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Return the cached plan or compute it, with at most one computation in flight per key.
    ///
    /// Late arrivals share the leader's result, including plans too degraded to store.
    /// If the leader fails or is dropped, one waiter takes over and computes again.
    #[tracing::instrument(name = "plan_cache", level = "debug", skip(self, compute), fields(key = %key))]
    pub async fn get_or_compute<F, Fut, E>(&self, key: &Fingerprint, compute: F) -> Result<TripPlan, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TripPlan, E>>,
    {
        let guard = loop {
            match self.claim(key) {
                Claim::Hit(plan) => {
                    debug!("Cache hit");
                    return Ok(plan);
                }
                Claim::Lead(guard) => break guard,
                Claim::Wait(mut rx) => {
                    debug!("Joining in-flight computation");
                    if let Ok(shared) = rx.wait_for(Option::is_some).await {
                        if let Some(plan) = shared.as_ref() {
                            return Ok(plan.clone());
                        }
                    }
                    debug!("In-flight computation abandoned, claiming again");
                }
            }
        };

        debug!("Cache miss, computing");
        let result = compute().await;
        if let Ok(plan) = &result {
            if let Some(ttl) = self.policy.ttl_for(plan) {
                self.put(key.clone(), plan.clone(), ttl);
            }
            guard.publish(plan.clone());
        }
        drop(guard);
        result
    }

    fn claim(&self, key: &Fingerprint) -> Claim<'_> {
        let now = Instant::now();
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                match occupied.get() {
                    Slot::Ready { plan, expires_at } if *expires_at > now => {
                        return Claim::Hit(plan.clone());
                    }
                    Slot::Pending { rx, .. } => return Claim::Wait(rx.clone()),
                    Slot::Ready { .. } => {}
                }
                let (slot, claim) = self.new_flight(key);
                occupied.insert(slot);
                claim
            }
            Entry::Vacant(vacant) => {
                let (slot, claim) = self.new_flight(key);
                vacant.insert(slot);
                claim
            }
        }
    }

    fn new_flight(&self, key: &Fingerprint) -> (Slot, Claim<'_>) {
        let flight = self.next_flight.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let guard = FlightGuard {
            cache: self,
            key: key.clone(),
            flight,
            tx,
        };
        (Slot::Pending { flight, rx }, Claim::Lead(guard))
    }

    /// Drop a stored plan. In-flight computations are left alone.
    pub fn invalidate(&self, key: &Fingerprint) -> bool {
        self.entries
            .remove_if(key, |_, slot| matches!(slot, Slot::Ready { .. }))
            .is_some()
    }

    /// Drop every stored plan
    pub fn clear(&self) {
        self.entries.retain(|_, slot| matches!(slot, Slot::Pending { .. }));
    }

    /// Drop expired plans, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| !matches!(slot, Slot::Ready { expires_at, .. } if *expires_at <= now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored plans, fresh or not yet purged
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.value(), Slot::Ready { .. }))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_expired(&self, key: &Fingerprint, now: Instant) {
        self.entries.remove_if(key, |_, slot| {
            matches!(slot, Slot::Ready { expires_at, .. } if *expires_at <= now)
        });
    }

    fn make_room(&self) {
        if self.purge_expired() > 0 && self.len() < self.policy.max_entries {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .filter_map(|e| match e.value() {
                Slot::Ready { expires_at, .. } => Some((e.key().clone(), *expires_at)),
                Slot::Pending { .. } => None,
            })
            .min_by_key(|(_, expires_at)| *expires_at)
            .map(|(key, _)| key);
        if let Some(key) = oldest {
            debug!(key = %key, "Evicting plan closest to expiry");
            self.invalidate(&key);
        }
    }
}
