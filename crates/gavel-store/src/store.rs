//! The [`AuctioneerStore`] trait — the contract the control loop
//! depends on.

use std::time::Duration;

use async_trait::async_trait;
use gavel_types::{ExecutorPresence, LrpStartAuction, LrpStopAuction};

use crate::error::StoreResult;
use crate::watch::{AuctionWatch, LockHandle};

/// Operations the auctioneer needs from the coordination store.
///
/// Implementations must be safe for concurrent use: the control loop
/// calls `watch_*` and `maintain_lock` while auction workers call the
/// claim/resolve and registry operations in parallel.
#[async_trait]
pub trait AuctioneerStore: Send + Sync + 'static {
    /// Begin the background lease-renewal protocol for the auctioneer
    /// lock. Emits `true` on the state stream whenever `identity` is
    /// confirmed to hold the lock, `false` when it is lost. Failure to
    /// initiate is returned here and is fatal to the caller.
    async fn maintain_lock(
        &self,
        interval: Duration,
        identity: &str,
    ) -> StoreResult<LockHandle>;

    /// Open a long-lived watch over newly created start-auctions.
    async fn watch_start_auctions(&self) -> AuctionWatch<LrpStartAuction>;

    /// Open a long-lived watch over newly created stop-auctions.
    async fn watch_stop_auctions(&self) -> AuctionWatch<LrpStopAuction>;

    /// Atomically transition a start-auction from pending to claimed.
    /// Fails if the record is missing or another auctioneer holds it.
    async fn claim_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()>;

    /// Finalize a claimed start-auction, removing it from the pending
    /// set. Always attempted after a successful claim.
    async fn resolve_start_auction(&self, auction: &LrpStartAuction) -> StoreResult<()>;

    /// Atomically transition a stop-auction from pending to claimed.
    async fn claim_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()>;

    /// Finalize a claimed stop-auction.
    async fn resolve_stop_auction(&self, auction: &LrpStopAuction) -> StoreResult<()>;

    /// Snapshot of the currently advertised executors.
    async fn all_executors(&self) -> StoreResult<Vec<ExecutorPresence>>;
}
