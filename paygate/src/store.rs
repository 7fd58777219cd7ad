//! In-memory registry of outstanding payment requests.
//!
//! The store is the single owner of live [`PaymentRequest`]s. Entries are
//! never modified in place: they are inserted by the issuer and removed either
//! by a successful verification ([`PaymentRequestStore::take_if_valid`]) or by
//! the expiry sweep. Expiry is also checked lazily on every read, so the sweep
//! is hygiene only.
//!
//! The store additionally remembers which transaction references have already
//! paid for a request, so one on-chain transfer cannot unlock two demands.
//! Claims are kept for a bounded window only; the chain verifiers reject
//! transfers older than the request they pay, so the window need only cover
//! a request's lifetime.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::error::{LookupError, TransactionAlreadyUsed};
use crate::network::{ChainFamily, Network};
use crate::request::{PaymentId, PaymentRequest};

/// Default retention of spent transaction references: 24 hours.
pub const DEFAULT_SPENT_RETENTION: chrono::Duration = chrono::Duration::hours(24);

/// Concurrent registry of pending payment requests keyed by id.
pub struct PaymentRequestStore {
    requests: DashMap<PaymentId, PaymentRequest>,
    spent: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
    spent_retention: chrono::Duration,
}

impl fmt::Debug for PaymentRequestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequestStore")
            .field("pending", &self.requests.len())
            .field("spent", &self.spent.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for PaymentRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRequestStore {
    /// Creates an empty store driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            requests: DashMap::new(),
            spent: DashMap::new(),
            clock,
            spent_retention: DEFAULT_SPENT_RETENTION,
        }
    }

    /// Sets how long spent transaction references are remembered.
    #[must_use]
    pub const fn with_spent_retention(mut self, retention: chrono::Duration) -> Self {
        self.spent_retention = retention;
        self
    }

    /// Returns the clock the store uses for expiry decisions.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Inserts a freshly issued request.
    ///
    /// Returns `false` without touching the store if a live entry already has
    /// the same id.
    pub fn insert(&self, request: PaymentRequest) -> bool {
        match self.requests.entry(request.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(request);
                true
            }
        }
    }

    /// Returns the request if it exists and has not expired.
    ///
    /// Expired and unknown ids are indistinguishable here.
    #[must_use]
    pub fn get(&self, id: &PaymentId) -> Option<PaymentRequest> {
        self.lookup(id).ok()
    }

    /// Reads a request without consuming it, telling expired entries apart
    /// from unknown ones.
    ///
    /// An expired entry reports [`LookupError::Expired`] until the sweep
    /// evicts it; from then on it is [`LookupError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when no live request has this id.
    pub fn lookup(&self, id: &PaymentId) -> Result<PaymentRequest, LookupError> {
        let entry = self.requests.get(id).ok_or(LookupError::NotFound)?;
        if entry.is_expired_at(self.clock.now()) {
            return Err(LookupError::Expired);
        }
        Ok(entry.value().clone())
    }

    /// Atomically checks expiry and removes the request.
    ///
    /// For any id at most one caller ever receives `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the request is gone or expired. An expired
    /// entry is left for the sweep.
    pub fn take_if_valid(&self, id: &PaymentId) -> Result<PaymentRequest, LookupError> {
        let now = self.clock.now();
        if let Some((_, request)) = self
            .requests
            .remove_if(id, |_, request| !request.is_expired_at(now))
        {
            return Ok(request);
        }
        if self.requests.contains_key(id) {
            Err(LookupError::Expired)
        } else {
            Err(LookupError::NotFound)
        }
    }

    /// Removes a request regardless of its expiry.
    pub fn remove(&self, id: &PaymentId) -> Option<PaymentRequest> {
        self.requests.remove(id).map(|(_, request)| request)
    }

    /// Records a transaction reference as spent.
    ///
    /// Account-chain hashes are compared case-insensitively. A stale record
    /// older than the retention window is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionAlreadyUsed`] when the reference is already claimed.
    pub fn claim_transaction(
        &self,
        network: Network,
        reference: &str,
    ) -> Result<(), TransactionAlreadyUsed> {
        let now = self.clock.now();
        match self.spent.entry(spent_key(network, reference)) {
            Entry::Occupied(mut claimed) => {
                if *claimed.get() + self.spent_retention > now {
                    return Err(TransactionAlreadyUsed(reference.to_owned()));
                }
                claimed.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        Ok(())
    }

    /// Forgets a claim made by [`claim_transaction`](Self::claim_transaction).
    pub fn release_transaction(&self, network: Network, reference: &str) {
        self.spent.remove(&spent_key(network, reference));
    }

    /// Removes expired requests and spent records past retention.
    ///
    /// Returns the number of payment requests removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        self.requests.retain(|_, request| {
            let keep = !request.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        let retention = self.spent_retention;
        self.spent.retain(|_, claimed_at| *claimed_at + retention > now);
        #[cfg(feature = "telemetry")]
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = self.requests.len(),
                "Swept expired payment requests"
            );
        }
        removed
    }

    /// Runs [`sweep`](Self::sweep) every `period` until `cancel` fires.
    pub async fn run_sweeper(self: Arc<Self>, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }
    }

    /// Spawns [`run_sweeper`](Self::run_sweeper) on the current tokio runtime.
    #[must_use]
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run_sweeper(period, cancel))
    }

    /// Number of stored requests, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` when no requests are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn spent_key(network: Network, reference: &str) -> String {
    let reference = reference.trim();
    match network.family() {
        ChainFamily::Account => format!("{network}:{}", reference.to_ascii_lowercase()),
        ChainFamily::Ledger => format!("{network}:{reference}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::request::Currency;

    fn request(id: &str, clock: &ManualClock, ttl_minutes: i64) -> PaymentRequest {
        let now = clock.now();
        PaymentRequest {
            id: PaymentId::new(id),
            amount: "0.10".parse().unwrap(),
            currency: Currency::Usdc,
            network: Network::Base,
            recipient: "0xRecipient".into(),
            description: String::new(),
            created_at: now,
            expires_at: now + ChronoDuration::minutes(ttl_minutes),
        }
    }

    fn store_with_clock() -> (PaymentRequestStore, ManualClock) {
        let clock = ManualClock::starting_now();
        (PaymentRequestStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_insert_then_get() {
        let (store, clock) = store_with_clock();
        assert!(store.insert(request("pay_1", &clock, 15)));
        assert_eq!(store.get(&"pay_1".into()).unwrap().id.as_str(), "pay_1");
        assert!(store.get(&"pay_2".into()).is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let (store, clock) = store_with_clock();
        assert!(store.insert(request("pay_1", &clock, 15)));
        assert!(!store.insert(request("pay_1", &clock, 30)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_take_is_single_use() {
        let (store, clock) = store_with_clock();
        store.insert(request("pay_1", &clock, 15));
        assert!(store.take_if_valid(&"pay_1".into()).is_ok());
        assert_eq!(
            store.take_if_valid(&"pay_1".into()),
            Err(LookupError::NotFound)
        );
        assert!(store.get(&"pay_1".into()).is_none());
    }

    #[test]
    fn test_expired_entries_are_hidden_then_swept() {
        let (store, clock) = store_with_clock();
        store.insert(request("pay_1", &clock, 15));
        clock.advance(ChronoDuration::minutes(15));

        assert!(store.get(&"pay_1".into()).is_none());
        assert_eq!(store.lookup(&"pay_1".into()), Err(LookupError::Expired));
        assert_eq!(
            store.take_if_valid(&"pay_1".into()),
            Err(LookupError::Expired)
        );

        assert_eq!(store.sweep(), 1);
        assert!(store.is_empty());
        assert_eq!(store.lookup(&"pay_1".into()), Err(LookupError::NotFound));
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let (store, clock) = store_with_clock();
        store.insert(request("short", &clock, 1));
        store.insert(request("long", &clock, 60));
        clock.advance(ChronoDuration::minutes(2));
        assert_eq!(store.sweep(), 1);
        assert!(store.get(&"long".into()).is_some());
    }

    #[test]
    fn test_concurrent_take_single_winner() {
        let (store, clock) = store_with_clock();
        store.insert(request("pay_1", &clock, 15));
        let store = Arc::new(store);
        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let store = Arc::clone(&store);
                    scope.spawn(move || usize::from(store.take_if_valid(&"pay_1".into()).is_ok()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_claim_transaction_once() {
        let (store, _clock) = store_with_clock();
        assert!(store.claim_transaction(Network::Base, "0xABC").is_ok());
        assert!(store.claim_transaction(Network::Base, "0xabc").is_err());
        // Same hash on another network is a different transaction.
        assert!(store.claim_transaction(Network::Polygon, "0xabc").is_ok());
    }

    #[test]
    fn test_ledger_claims_are_case_sensitive() {
        let (store, _clock) = store_with_clock();
        assert!(store.claim_transaction(Network::Solana, "5Sig").is_ok());
        assert!(store.claim_transaction(Network::Solana, "5sig").is_ok());
    }

    #[test]
    fn test_release_and_retention() {
        let (store, clock) = store_with_clock();
        let store = store.with_spent_retention(ChronoDuration::hours(1));
        store.claim_transaction(Network::Base, "0x1").unwrap();
        store.release_transaction(Network::Base, "0x1");
        assert!(store.claim_transaction(Network::Base, "0x1").is_ok());

        clock.advance(ChronoDuration::hours(2));
        assert!(store.claim_transaction(Network::Base, "0x1").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_until_cancelled() {
        let (store, clock) = store_with_clock();
        store.insert(request("pay_1", &clock, 1));
        let store = Arc::new(store);
        let cancel = CancellationToken::new();
        let handle = store.spawn_sweeper(Duration::from_secs(60), cancel.clone());

        clock.advance(ChronoDuration::minutes(5));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
