//! A controllable [`AuctioneerStore`] double for driving the control
//! loop from tests.
//!
//! The fake pre-creates its lock and event channels, so tests can push
//! lock ticks and auction events before or after the auctioneer opens
//! its side, close an event stream to simulate a watch rotation, inject
//! claim/registry/lock failures, and read back every claim and resolve
//! the auctioneer issued. Misuse (sending on a stream the test already
//! closed, releasing a lock that was never maintained) panics with a
//! pointed message rather than hanging the test.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};

use gavel_types::{ExecutorPresence, LrpStartAuction, LrpStopAuction};

use crate::error::{StoreError, StoreResult};
use crate::store::AuctioneerStore;
use crate::watch::{AuctionWatch, LockHandle, LockReleaser};

struct FakeWatch<T> {
    events_tx: Option<mpsc::Sender<T>>,
    events_rx: Option<mpsc::Receiver<T>>,
    errors_tx: Option<mpsc::Sender<StoreError>>,
    errors_rx: Option<mpsc::Receiver<StoreError>>,
    cancel_rx: Option<oneshot::Receiver<()>>,
}

impl<T> FakeWatch<T> {
    fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        Self {
            events_tx: Some(events_tx),
            events_rx: Some(events_rx),
            errors_tx: Some(errors_tx),
            errors_rx: Some(errors_rx),
            cancel_rx: None,
        }
    }

    /// Replace both streams with fresh ones, as a store would when a
    /// watch is re-established.
    fn reset(&mut self) {
        let (events_tx, events_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = mpsc::channel(1);
        self.events_tx = Some(events_tx);
        self.events_rx = Some(events_rx);
        self.errors_tx = Some(errors_tx);
        self.errors_rx = Some(errors_rx);
    }

    /// Hand the receiving side out to a watcher, creating fresh streams
    /// if the previous ones were already consumed.
    fn open(&mut self) -> AuctionWatch<T> {
        if self.events_rx.is_none() {
            self.reset();
        }
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel_rx = Some(cancel_rx);
        AuctionWatch {
            events: self.events_rx.take().expect("fake watch stream missing"),
            errors: self.errors_rx.take().expect("fake watch error stream missing"),
            cancel: cancel_tx,
        }
    }

    fn cancelled(&mut self) -> bool {
        match &mut self.cancel_rx {
            Some(rx) => !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)),
            None => false,
        }
    }
}

struct FakeInner {
    executors: Vec<ExecutorPresence>,
    executors_error: Option<StoreError>,
    maintain_lock_error: Option<StoreError>,
    claim_start_error: Option<StoreError>,
    claim_stop_error: Option<StoreError>,
    claimed_start: Vec<LrpStartAuction>,
    resolved_start: Vec<LrpStartAuction>,
    claimed_stop: Vec<LrpStopAuction>,
    resolved_stop: Vec<LrpStopAuction>,
    lock_states_tx: mpsc::Sender<bool>,
    lock_states_rx: Option<mpsc::Receiver<bool>>,
    release_tx: mpsc::Sender<oneshot::Sender<()>>,
    release_rx: Option<mpsc::Receiver<oneshot::Sender<()>>>,
    start_watch: FakeWatch<LrpStartAuction>,
    stop_watch: FakeWatch<LrpStopAuction>,
}

/// Scriptable in-memory [`AuctioneerStore`] double.
pub struct FakeStore {
    inner: Mutex<FakeInner>,
}

impl FakeStore {
    pub fn new() -> Self {
        let (lock_states_tx, lock_states_rx) = mpsc::channel(1);
        let (release_tx, release_rx) = mpsc::channel(1);
        Self {
            inner: Mutex::new(FakeInner {
                executors: Vec::new(),
                executors_error: None,
                maintain_lock_error: None,
                claim_start_error: None,
                claim_stop_error: None,
                claimed_start: Vec::new(),
                resolved_start: Vec::new(),
                claimed_stop: Vec::new(),
                resolved_stop: Vec::new(),
                lock_states_tx,
                lock_states_rx: Some(lock_states_rx),
                release_tx,
                release_rx: Some(release_rx),
                start_watch: FakeWatch::new(),
                stop_watch: FakeWatch::new(),
            }),
        }
    }

    // ── Scripting: lock ─────────────────────────────────────────────

    /// Deliver a lock-state tick to the auctioneer.
    pub async fn send_lock_state(&self, have_lock: bool) {
        let tx = self.inner.lock().await.lock_states_tx.clone();
        tx.send(have_lock)
            .await
            .expect("auctioneer dropped the lock state stream");
    }

    /// Make the next `maintain_lock` call fail.
    pub async fn fail_maintain_lock(&self, error: StoreError) {
        self.inner.lock().await.maintain_lock_error = Some(error);
    }

    /// Wait for the auctioneer to start the release handshake and hand
    /// back the acknowledgement sender; completing it (or dropping it)
    /// unblocks the auctioneer.
    pub async fn expect_release(&self) -> oneshot::Sender<()> {
        let mut rx = self
            .inner
            .lock()
            .await
            .release_rx
            .take()
            .expect("expect_release is already being awaited");
        let ack = rx.recv().await.expect("auctioneer dropped the release channel");
        self.inner.lock().await.release_rx = Some(rx);
        ack
    }

    // ── Scripting: executors ────────────────────────────────────────

    pub async fn set_executors(&self, executors: Vec<ExecutorPresence>) {
        self.inner.lock().await.executors = executors;
    }

    pub async fn fail_all_executors(&self, error: StoreError) {
        self.inner.lock().await.executors_error = Some(error);
    }

    // ── Scripting: start-auction watch ──────────────────────────────

    pub async fn send_start_auction(&self, auction: LrpStartAuction) {
        let tx = self
            .inner
            .lock()
            .await
            .start_watch
            .events_tx
            .clone()
            .expect("start-auction stream closed; call reset_start_watch first");
        tx.send(auction)
            .await
            .expect("auctioneer dropped the start-auction stream");
    }

    /// Close the event stream the auctioneer is watching, as the store
    /// does when it rotates a watch.
    pub async fn close_start_auctions(&self) {
        self.inner.lock().await.start_watch.events_tx = None;
    }

    pub async fn send_start_watch_error(&self, error: StoreError) {
        let tx = self
            .inner
            .lock()
            .await
            .start_watch
            .errors_tx
            .clone()
            .expect("start-auction error stream closed; call reset_start_watch first");
        tx.send(error)
            .await
            .expect("auctioneer dropped the start-auction error stream");
    }

    /// Install fresh start-auction streams for the next watch.
    pub async fn reset_start_watch(&self) {
        self.inner.lock().await.start_watch.reset();
    }

    /// Whether the auctioneer has cancelled (or dropped) its current
    /// start-auction watch.
    pub async fn start_watch_cancelled(&self) -> bool {
        self.inner.lock().await.start_watch.cancelled()
    }

    // ── Scripting: stop-auction watch ───────────────────────────────

    pub async fn send_stop_auction(&self, auction: LrpStopAuction) {
        let tx = self
            .inner
            .lock()
            .await
            .stop_watch
            .events_tx
            .clone()
            .expect("stop-auction stream closed; call reset_stop_watch first");
        tx.send(auction)
            .await
            .expect("auctioneer dropped the stop-auction stream");
    }

    pub async fn close_stop_auctions(&self) {
        self.inner.lock().await.stop_watch.events_tx = None;
    }

    pub async fn send_stop_watch_error(&self, error: StoreError) {
        let tx = self
            .inner
            .lock()
            .await
            .stop_watch
            .errors_tx
            .clone()
            .expect("stop-auction error stream closed; call reset_stop_watch first");
        tx.send(error)
            .await
            .expect("auctioneer dropped the stop-auction error stream");
    }

    pub async fn reset_stop_watch(&self) {
        self.inner.lock().await.stop_watch.reset();
    }

    pub async fn stop_watch_cancelled(&self) -> bool {
        self.inner.lock().await.stop_watch.cancelled()
    }

    // ── Scripting: claims and resolves ──────────────────────────────

    pub async fn fail_claim_start_auctions(&self, error: StoreError) {
        self.inner.lock().await.claim_start_error = Some(error);
    }

    pub async fn fail_claim_stop_auctions(&self, error: StoreError) {
        self.inner.lock().await.claim_stop_error = Some(error);
    }

    pub async fn claimed_start_auctions(&self) -> Vec<LrpStartAuction> {
        self.inner.lock().await.claimed_start.clone()
    }

    pub async fn resolved_start_auctions(&self) -> Vec<LrpStartAuction> {
        self.inner.lock().await.resolved_start.clone()
    }

    pub async fn claimed_stop_auctions(&self) -> Vec<LrpStopAuction> {
        self.inner.lock().await.claimed_stop.clone()
    }

    pub async fn resolved_stop_auctions(&self) -> Vec<LrpStopAuction> {
        self.inner.lock().await.resolved_stop.clone()
    }
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuctioneerStore for FakeStore {
    async fn maintain_lock(
        &self,
        _interval: Duration,
        _identity: &str,
    ) -> StoreResult<LockHandle> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.maintain_lock_error.clone() {
            return Err(error);
        }
        let states = inner
            .lock_states_rx
            .take()
            .expect("maintain_lock called more than once");
        Ok(LockHandle {
            states,
            releaser: LockReleaser::new(inner.release_tx.clone()),
        })
    }

    async fn watch_start_auctions(&self) -> AuctionWatch<LrpStartAuction> {
        self.inner.lock().await.start_watch.open()
    }

    async fn watch_stop_auctions(&self) -> AuctionWatch<LrpStopAuction> {
        self.inner.lock().await.stop_watch.open()
    }

    async fn claim_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.claim_start_error.clone() {
            return Err(error);
        }
        inner.claimed_start.push(auction.clone());
        Ok(())
    }

    async fn resolve_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()> {
        self.inner.lock().await.resolved_start.push(auction.clone());
        Ok(())
    }

    async fn claim_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.claim_stop_error.clone() {
            return Err(error);
        }
        inner.claimed_stop.push(auction.clone());
        Ok(())
    }

    async fn resolve_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()> {
        self.inner.lock().await.resolved_stop.push(auction.clone());
        Ok(())
    }

    async fn all_executors(&self) -> StoreResult<Vec<ExecutorPresence>> {
        let inner = self.inner.lock().await;
        if let Some(error) = inner.executors_error.clone() {
            return Err(error);
        }
        Ok(inner.executors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_types::DesiredLrp;

    fn start_auction() -> LrpStartAuction {
        LrpStartAuction {
            desired_lrp: DesiredLrp {
                process_guid: "my-guid".to_string(),
                stack: "lucid64".to_string(),
                instances: 1,
                memory_mb: 128,
                disk_mb: 512,
            },
            instance_guid: "instance-1".to_string(),
            index: 0,
            num_azs: 1,
        }
    }

    #[tokio::test]
    async fn events_pushed_before_the_watch_opens_are_delivered() {
        let store = FakeStore::new();
        store.send_start_auction(start_auction()).await;

        let mut watch = store.watch_start_auctions().await;
        assert_eq!(watch.events.recv().await, Some(start_auction()));
    }

    #[tokio::test]
    async fn closing_the_stream_ends_the_watch() {
        let store = FakeStore::new();
        let mut watch = store.watch_start_auctions().await;

        store.close_start_auctions().await;
        assert_eq!(watch.events.recv().await, None);
    }

    #[tokio::test]
    async fn reset_installs_fresh_streams() {
        let store = FakeStore::new();
        let _first = store.watch_start_auctions().await;

        store.close_start_auctions().await;
        store.reset_start_watch().await;

        let mut second = store.watch_start_auctions().await;
        store.send_start_auction(start_auction()).await;
        assert_eq!(second.events.recv().await, Some(start_auction()));
    }

    #[tokio::test]
    async fn cancellation_is_observable() {
        let store = FakeStore::new();
        let watch = store.watch_start_auctions().await;

        assert!(!store.start_watch_cancelled().await);
        let _ = watch.cancel.send(());
        assert!(store.start_watch_cancelled().await);
    }

    #[tokio::test]
    async fn claim_error_suppresses_recording() {
        let store = FakeStore::new();
        store
            .fail_claim_start_auctions(StoreError::AlreadyClaimed)
            .await;

        let auction = start_auction();
        assert_eq!(
            store.claim_start_auction(&auction).await,
            Err(StoreError::AlreadyClaimed)
        );
        assert!(store.claimed_start_auctions().await.is_empty());
    }

    #[tokio::test]
    async fn release_handshake_roundtrips() {
        let store = FakeStore::new();
        let handle = store
            .maintain_lock(Duration::from_secs(1), "test-identity")
            .await
            .unwrap();

        let release = tokio::spawn(async move { handle.releaser.release().await });

        let ack = store.expect_release().await;
        let _ = ack.send(());
        release.await.unwrap();
    }
}
