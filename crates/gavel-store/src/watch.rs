//! Channel-shaped handles returned by store operations.
//!
//! A watch is a triple of event stream, error stream, and cancel signal;
//! the lock is a state stream plus a release handshake. Both sides of
//! every channel close when their peer is dropped, so tearing a handle
//! down never leaks a store-side task.

use tokio::sync::{mpsc, oneshot};

use crate::error::StoreError;

/// Buffer for auction-event streams.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Buffer for lock-state streams.
pub(crate) const LOCK_CHANNEL_CAPACITY: usize = 8;

/// A long-lived watch over one auction-event stream.
///
/// `events` delivers records as they are created. `errors` delivers at
/// most one fatal watch error, after which `events` may close. Sending
/// on (or dropping) `cancel` asks the store to stop producing.
pub struct AuctionWatch<T> {
    pub events: mpsc::Receiver<T>,
    pub errors: mpsc::Receiver<StoreError>,
    pub cancel: oneshot::Sender<()>,
}

/// An active lock-maintenance session.
///
/// `states` emits `true` whenever the local identity is confirmed to
/// hold the auctioneer lock and `false` when it is lost; the stream
/// stays open for the life of the session. `releaser` performs the
/// shutdown handshake.
pub struct LockHandle {
    pub states: mpsc::Receiver<bool>,
    pub releaser: LockReleaser,
}

/// One-shot release side of a [`LockHandle`].
pub struct LockReleaser {
    release: mpsc::Sender<oneshot::Sender<()>>,
}

impl LockReleaser {
    pub fn new(release: mpsc::Sender<oneshot::Sender<()>>) -> Self {
        Self { release }
    }

    /// Release the lock and wait for the store to acknowledge.
    ///
    /// Sends a fresh acknowledgement channel to the store and blocks
    /// until the store completes it. A store that has already gone away
    /// counts as released.
    pub async fn release(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.release.send(ack_tx).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_completes_when_store_acknowledges() {
        let (tx, mut rx) = mpsc::channel(1);
        let releaser = LockReleaser::new(tx);

        let store_side = tokio::spawn(async move {
            let ack: oneshot::Sender<()> = rx.recv().await.unwrap();
            let _ = ack.send(());
        });

        releaser.release().await;
        store_side.await.unwrap();
    }

    #[tokio::test]
    async fn release_completes_when_store_is_gone() {
        let (tx, rx) = mpsc::channel::<oneshot::Sender<()>>(1);
        drop(rx);

        // Must not hang even though nobody will acknowledge.
        LockReleaser::new(tx).release().await;
    }
}
