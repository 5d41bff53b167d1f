//! The auctioneer control loop.
//!
//! A single task multiplexes the lock-state stream, both auction-event
//! watches, both watch error streams, and the signal stream. Watch
//! lifecycle is coupled to the leader lease: watches open on a `true`
//! lock tick and close on lock loss. A watch that closes or errors on
//! its own is only re-established on the next `true` lock tick — watch
//! faults are often symptomatic of lease trouble, and the lease tick is
//! the safe re-synchronization point.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use gavel_store::{AuctionWatch, AuctioneerStore, LockHandle, StoreError};
use gavel_types::{AuctionRunner, LrpStartAuction, LrpStopAuction};

use crate::config::Config;
use crate::error::AuctioneerError;
use crate::signal::Signal;
use crate::worker;

/// The cluster-singleton auction coordinator.
///
/// Construct with a store, a runner, and a [`Config`], then drive it
/// with [`Auctioneer::run`]. The store and runner are shared with the
/// auction workers the loop spawns.
pub struct Auctioneer<S, R> {
    store: Arc<S>,
    runner: Arc<R>,
    config: Config,
}

impl<S, R> Auctioneer<S, R>
where
    S: AuctioneerStore,
    R: AuctionRunner,
{
    pub fn new(store: Arc<S>, runner: Arc<R>, config: Config) -> Self {
        Self {
            store,
            runner,
            config,
        }
    }

    /// Run the control loop until a shutdown signal arrives.
    ///
    /// `ready` fires once, the first time leadership is held; it is
    /// never retracted. Returns `Ok(())` on clean shutdown — after the
    /// lock-release handshake has completed — and an error only if the
    /// configuration is invalid or lock maintenance cannot start.
    pub async fn run(
        self,
        signals: mpsc::Receiver<Signal>,
        ready: oneshot::Sender<()>,
    ) -> Result<(), AuctioneerError> {
        self.config.validate()?;

        let identity = self
            .config
            .identity
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let LockHandle { states, releaser } = self
            .store
            .maintain_lock(self.config.lock_interval, &identity)
            .await
            .map_err(AuctioneerError::Lock)?;

        info!(%identity, "auctioneer started, contending for the lock");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));

        let mut lock_states = Some(states);
        let mut releaser = Some(releaser);
        let mut signals = Some(signals);
        let mut ready = Some(ready);

        // Per-watch triples, the non-leader state being all-None.
        let mut start_events: Option<mpsc::Receiver<LrpStartAuction>> = None;
        let mut start_errors: Option<mpsc::Receiver<StoreError>> = None;
        let mut start_cancel: Option<oneshot::Sender<()>> = None;

        let mut stop_events: Option<mpsc::Receiver<LrpStopAuction>> = None;
        let mut stop_errors: Option<mpsc::Receiver<StoreError>> = None;
        let mut stop_cancel: Option<oneshot::Sender<()>> = None;

        loop {
            tokio::select! {
                tick = recv_opt(&mut lock_states) => match tick {
                    Some(have_lock) => {
                        info!(have_lock, "lock state");
                        if have_lock {
                            if start_events.is_none() {
                                let AuctionWatch { events, errors, cancel } =
                                    self.store.watch_start_auctions().await;
                                start_events = Some(events);
                                start_errors = Some(errors);
                                start_cancel = Some(cancel);
                                info!("watching for start auctions");
                            }
                            if stop_events.is_none() {
                                let AuctionWatch { events, errors, cancel } =
                                    self.store.watch_stop_auctions().await;
                                stop_events = Some(events);
                                stop_errors = Some(errors);
                                stop_cancel = Some(cancel);
                                info!("watching for stop auctions");
                            }
                            if let Some(ready) = ready.take() {
                                let _ = ready.send(());
                            }
                        } else {
                            if let Some(cancel) = start_cancel.take() {
                                let _ = cancel.send(());
                            }
                            start_events = None;
                            start_errors = None;
                            if let Some(cancel) = stop_cancel.take() {
                                let _ = cancel.send(());
                            }
                            stop_events = None;
                            stop_errors = None;
                        }
                    }
                    None => {
                        // The store contract keeps this stream open for
                        // the process lifetime; losing it means we can no
                        // longer trust our leadership.
                        warn!("lock state stream ended, standing down");
                        lock_states = None;
                        if let Some(cancel) = start_cancel.take() {
                            let _ = cancel.send(());
                        }
                        start_events = None;
                        start_errors = None;
                        if let Some(cancel) = stop_cancel.take() {
                            let _ = cancel.send(());
                        }
                        stop_events = None;
                        stop_errors = None;
                    }
                },

                event = recv_opt(&mut start_events) => match event {
                    Some(auction) => {
                        tokio::spawn(worker::run_start_auction(
                            Arc::clone(&self.store),
                            Arc::clone(&self.runner),
                            Arc::clone(&semaphore),
                            self.config.max_rounds,
                            auction,
                        ));
                    }
                    None => {
                        // The store rotated the watch out from under us;
                        // the next lock tick reopens it.
                        debug!("start auction stream closed");
                        start_events = None;
                        start_errors = None;
                        start_cancel = None;
                    }
                },

                watch_error = recv_opt(&mut start_errors) => {
                    if let Some(watch_error) = watch_error {
                        error!(error = %watch_error, "start auction watch failed");
                    }
                    start_events = None;
                    start_errors = None;
                    start_cancel = None;
                },

                event = recv_opt(&mut stop_events) => match event {
                    Some(auction) => {
                        tokio::spawn(worker::run_stop_auction(
                            Arc::clone(&self.store),
                            Arc::clone(&self.runner),
                            auction,
                        ));
                    }
                    None => {
                        debug!("stop auction stream closed");
                        stop_events = None;
                        stop_errors = None;
                        stop_cancel = None;
                    }
                },

                watch_error = recv_opt(&mut stop_errors) => {
                    if let Some(watch_error) = watch_error {
                        error!(error = %watch_error, "stop auction watch failed");
                    }
                    stop_events = None;
                    stop_errors = None;
                    stop_cancel = None;
                },

                signal = recv_opt(&mut signals) => match signal {
                    Some(signal) if signal.should_stop() => {
                        info!(?signal, "shutdown signal received, releasing lock");
                        if let Some(releaser) = releaser.take() {
                            releaser.release().await;
                        }
                        if let Some(cancel) = start_cancel.take() {
                            info!("stopping start auction watch");
                            let _ = cancel.send(());
                        }
                        if let Some(cancel) = stop_cancel.take() {
                            info!("stopping stop auction watch");
                            let _ = cancel.send(());
                        }
                        return Ok(());
                    }
                    Some(signal) => {
                        debug!(?signal, "ignoring signal");
                    }
                    None => {
                        signals = None;
                    }
                },
            }
        }
    }
}

/// Receive from an optional stream; a missing stream never produces.
async fn recv_opt<T>(channel: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match channel {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
