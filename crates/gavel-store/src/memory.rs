//! MemoryStore — a functional in-process coordination store.
//!
//! Implements the full [`AuctioneerStore`] contract inside one process:
//! lock leases with contention between identities, watch fan-out to any
//! number of watchers, atomic claim/resolve transitions, and an executor
//! registry. Single-node deployments and end-to-end tests run against
//! it; the production store behind the same trait is a shared
//! hierarchical key-value store.
//!
//! Watches opened here never produce on their error stream — there is no
//! wire to fail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::debug;

use gavel_types::{ExecutorPresence, LrpStartAuction, LrpStopAuction};

use crate::error::{StoreError, StoreResult};
use crate::store::AuctioneerStore;
use crate::watch::{
    AuctionWatch, EVENT_CHANNEL_CAPACITY, LOCK_CHANNEL_CAPACITY, LockHandle, LockReleaser,
};

/// Claim state of a pending auction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuctionLifecycle {
    Pending,
    Claimed,
}

struct Watcher<T> {
    id: u64,
    events: mpsc::Sender<T>,
}

#[derive(Default)]
struct Inner {
    executors: Vec<ExecutorPresence>,
    start_auctions: HashMap<LrpStartAuction, AuctionLifecycle>,
    stop_auctions: HashMap<LrpStopAuction, AuctionLifecycle>,
    start_watchers: Vec<Watcher<LrpStartAuction>>,
    stop_watchers: Vec<Watcher<LrpStopAuction>>,
    next_watcher_id: u64,
    lock_owner: Option<String>,
}

/// In-process [`AuctioneerStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise an executor in the registry, replacing any previous
    /// presence with the same ID.
    pub async fn register_executor(&self, executor: ExecutorPresence) {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .executors
            .iter_mut()
            .find(|e| e.executor_id == executor.executor_id)
        {
            *existing = executor;
        } else {
            inner.executors.push(executor);
        }
    }

    /// Create a pending start-auction and fan it out to watchers.
    /// Requests for a record that is already pending are deduplicated.
    pub async fn request_start_auction(&self, auction: LrpStartAuction) {
        let watchers: Vec<mpsc::Sender<LrpStartAuction>> = {
            let mut inner = self.inner.lock().await;
            if inner.start_auctions.contains_key(&auction) {
                return;
            }
            inner
                .start_auctions
                .insert(auction.clone(), AuctionLifecycle::Pending);
            inner.start_watchers.iter().map(|w| w.events.clone()).collect()
        };
        for watcher in watchers {
            let _ = watcher.send(auction.clone()).await;
        }
    }

    /// Create a pending stop-auction and fan it out to watchers.
    pub async fn request_stop_auction(&self, auction: LrpStopAuction) {
        let watchers: Vec<mpsc::Sender<LrpStopAuction>> = {
            let mut inner = self.inner.lock().await;
            if inner.stop_auctions.contains_key(&auction) {
                return;
            }
            inner
                .stop_auctions
                .insert(auction.clone(), AuctionLifecycle::Pending);
            inner.stop_watchers.iter().map(|w| w.events.clone()).collect()
        };
        for watcher in watchers {
            let _ = watcher.send(auction.clone()).await;
        }
    }

    /// Identity currently holding the auctioneer lock, if any.
    pub async fn lock_owner(&self) -> Option<String> {
        self.inner.lock().await.lock_owner.clone()
    }
}

fn claim<K: std::hash::Hash + Eq>(
    auctions: &mut HashMap<K, AuctionLifecycle>,
    key: &K,
) -> StoreResult<()> {
    match auctions.get_mut(key) {
        None => Err(StoreError::NotFound),
        Some(state @ AuctionLifecycle::Pending) => {
            *state = AuctionLifecycle::Claimed;
            Ok(())
        }
        Some(AuctionLifecycle::Claimed) => Err(StoreError::AlreadyClaimed),
    }
}

fn resolve<K: std::hash::Hash + Eq>(
    auctions: &mut HashMap<K, AuctionLifecycle>,
    key: &K,
) -> StoreResult<()> {
    match auctions.remove(key) {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound),
    }
}

#[async_trait]
impl AuctioneerStore for MemoryStore {
    async fn maintain_lock(
        &self,
        interval: Duration,
        identity: &str,
    ) -> StoreResult<LockHandle> {
        let (state_tx, state_rx) = mpsc::channel(LOCK_CHANNEL_CAPACITY);
        let (release_tx, mut release_rx) = mpsc::channel::<oneshot::Sender<()>>(1);
        let identity = identity.to_string();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let have_lock = {
                            let mut inner = inner.lock().await;
                            match &inner.lock_owner {
                                None => {
                                    inner.lock_owner = Some(identity.clone());
                                    true
                                }
                                Some(owner) => owner == &identity,
                            }
                        };
                        if state_tx.send(have_lock).await.is_err() {
                            break;
                        }
                    }
                    ack = release_rx.recv() => {
                        debug!(%identity, "lock released");
                        let mut inner = inner.lock().await;
                        if inner.lock_owner.as_deref() == Some(identity.as_str()) {
                            inner.lock_owner = None;
                        }
                        drop(inner);
                        if let Some(ack) = ack {
                            let _ = ack.send(());
                        }
                        return;
                    }
                }
            }
            // The holder went away without releasing; drop the lease so
            // another identity can take over.
            let mut inner = inner.lock().await;
            if inner.lock_owner.as_deref() == Some(identity.as_str()) {
                inner.lock_owner = None;
            }
        });

        Ok(LockHandle {
            states: state_rx,
            releaser: LockReleaser::new(release_tx),
        })
    }

    async fn watch_start_auctions(&self) -> AuctionWatch<LrpStartAuction> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let id = {
            let mut inner = self.inner.lock().await;
            let id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            inner.start_watchers.push(Watcher { id, events: event_tx });
            id
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _ = cancel_rx.await;
            inner.lock().await.start_watchers.retain(|w| w.id != id);
            drop(error_tx);
        });

        AuctionWatch {
            events: event_rx,
            errors: error_rx,
            cancel: cancel_tx,
        }
    }

    async fn watch_stop_auctions(&self) -> AuctionWatch<LrpStopAuction> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let id = {
            let mut inner = self.inner.lock().await;
            let id = inner.next_watcher_id;
            inner.next_watcher_id += 1;
            inner.stop_watchers.push(Watcher { id, events: event_tx });
            id
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _ = cancel_rx.await;
            inner.lock().await.stop_watchers.retain(|w| w.id != id);
            drop(error_tx);
        });

        AuctionWatch {
            events: event_rx,
            errors: error_rx,
            cancel: cancel_tx,
        }
    }

    async fn claim_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()> {
        claim(&mut self.inner.lock().await.start_auctions, auction)
    }

    async fn resolve_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()> {
        resolve(&mut self.inner.lock().await.start_auctions, auction)
    }

    async fn claim_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()> {
        claim(&mut self.inner.lock().await.stop_auctions, auction)
    }

    async fn resolve_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()> {
        resolve(&mut self.inner.lock().await.stop_auctions, auction)
    }

    async fn all_executors(&self) -> StoreResult<Vec<ExecutorPresence>> {
        Ok(self.inner.lock().await.executors.clone())
    }
}
