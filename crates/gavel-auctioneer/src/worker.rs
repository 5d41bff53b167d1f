//! Auction workers — one detached task per scheduling event.
//!
//! Workers are never cancelled; once a claim succeeds, the resolve is
//! attempted on every exit path so claimed records cannot leak back
//! into the pending set. All fallible steps between claim and resolve
//! therefore live in the `perform_*` inner functions, and the single
//! caller resolves unconditionally after they return.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use gavel_store::AuctioneerStore;
use gavel_types::{
    AuctionRunner, LrpStartAuction, LrpStopAuction, StartAuctionRequest, StartAuctionRules,
    StopAuctionRequest,
};

use crate::selector;

/// Handle one start-auction: admit, claim, auction, resolve.
pub(crate) async fn run_start_auction<S, R>(
    store: Arc<S>,
    runner: Arc<R>,
    semaphore: Arc<Semaphore>,
    max_rounds: u32,
    auction: LrpStartAuction,
) where
    S: AuctioneerStore,
    R: AuctionRunner,
{
    // Admission precedes the claim so that work pressure backs up into
    // the event stream instead of piling up claimed auctions.
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return;
    };

    let process_guid = auction.desired_lrp.process_guid.clone();
    info!(%process_guid, instance_guid = %auction.instance_guid, "start auction received");

    if let Err(error) = store.claim_start_auction(&auction).await {
        debug!(%process_guid, %error, "failed to claim start auction");
        return;
    }

    perform_start_auction(store.as_ref(), runner.as_ref(), max_rounds, &auction).await;

    if let Err(error) = store.resolve_start_auction(&auction).await {
        error!(%process_guid, %error, "failed to resolve start auction");
    }
}

async fn perform_start_auction<S, R>(
    store: &S,
    runner: &R,
    max_rounds: u32,
    auction: &LrpStartAuction,
) where
    S: AuctioneerStore,
    R: AuctionRunner,
{
    let stack = &auction.desired_lrp.stack;
    let rep_guids = match selector::start_candidates(store, stack).await {
        Ok(rep_guids) => rep_guids,
        Err(error) => {
            error!(%error, "failed to list executors");
            return;
        }
    };
    if rep_guids.is_empty() {
        error!(%stack, "no compatible executors advertised");
        return;
    }

    info!(candidates = rep_guids.len(), "running start auction");

    let request = StartAuctionRequest {
        start_auction: auction.clone(),
        rep_guids,
        rules: StartAuctionRules {
            max_rounds,
            ..StartAuctionRules::default()
        },
    };
    if let Err(error) = runner.run_lrp_start_auction(request).await {
        error!(%error, "auction failed");
    }
}

/// Handle one stop-auction: claim, auction, resolve. Stop-auctions are
/// cheap reconciliations and run unbounded.
pub(crate) async fn run_stop_auction<S, R>(store: Arc<S>, runner: Arc<R>, auction: LrpStopAuction)
where
    S: AuctioneerStore,
    R: AuctionRunner,
{
    let process_guid = auction.process_guid.clone();
    debug!(%process_guid, index = auction.index, "stop auction received");

    if let Err(error) = store.claim_stop_auction(&auction).await {
        debug!(%process_guid, %error, "failed to claim stop auction");
        return;
    }

    perform_stop_auction(store.as_ref(), runner.as_ref(), &auction).await;

    if let Err(error) = store.resolve_stop_auction(&auction).await {
        error!(%process_guid, %error, "failed to resolve stop auction");
    }
}

async fn perform_stop_auction<S, R>(store: &S, runner: &R, auction: &LrpStopAuction)
where
    S: AuctioneerStore,
    R: AuctionRunner,
{
    let rep_guids = match selector::stop_candidates(store).await {
        Ok(rep_guids) => rep_guids,
        Err(error) => {
            error!(%error, "failed to list executors");
            return;
        }
    };
    if rep_guids.is_empty() {
        error!("no executors advertised");
        return;
    }

    info!(candidates = rep_guids.len(), "running stop auction");

    let request = StopAuctionRequest {
        stop_auction: auction.clone(),
        rep_guids,
    };
    if let Err(error) = runner.run_lrp_stop_auction(request).await {
        error!(%error, "auction failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_store::StoreError;
    use gavel_store::fake::FakeStore;
    use gavel_types::fake::FakeRunner;
    use gavel_types::{DesiredLrp, ExecutorPresence};

    fn executor(id: &str, stack: &str) -> ExecutorPresence {
        ExecutorPresence {
            executor_id: id.to_string(),
            stack: stack.to_string(),
        }
    }

    fn start_auction(stack: &str) -> LrpStartAuction {
        LrpStartAuction {
            desired_lrp: DesiredLrp {
                process_guid: "my-guid".to_string(),
                stack: stack.to_string(),
                instances: 1,
                memory_mb: 128,
                disk_mb: 512,
            },
            instance_guid: "instance-1".to_string(),
            index: 0,
            num_azs: 1,
        }
    }

    fn stop_auction() -> LrpStopAuction {
        LrpStopAuction {
            process_guid: "my-stop-guid".to_string(),
            index: 0,
            num_instances: 1,
            num_azs: 1,
        }
    }

    fn harness() -> (Arc<FakeStore>, Arc<FakeRunner>, Arc<Semaphore>) {
        (
            Arc::new(FakeStore::new()),
            Arc::new(FakeRunner::new()),
            Arc::new(Semaphore::new(2)),
        )
    }

    #[tokio::test]
    async fn failed_claim_skips_auction_and_resolve() {
        let (store, runner, semaphore) = harness();
        store
            .fail_claim_start_auctions(StoreError::AlreadyClaimed)
            .await;

        run_start_auction(
            store.clone(),
            runner.clone(),
            semaphore,
            10,
            start_auction("lucid64"),
        )
        .await;

        assert_eq!(runner.start_auction_count().await, 0);
        assert!(store.resolved_start_auctions().await.is_empty());
    }

    #[tokio::test]
    async fn executor_listing_failure_still_resolves() {
        let (store, runner, semaphore) = harness();
        store
            .fail_all_executors(StoreError::Unavailable("down".to_string()))
            .await;

        run_start_auction(
            store.clone(),
            runner.clone(),
            semaphore,
            10,
            start_auction("lucid64"),
        )
        .await;

        assert_eq!(runner.start_auction_count().await, 0);
        assert_eq!(
            store.resolved_start_auctions().await,
            vec![start_auction("lucid64")]
        );
    }

    #[tokio::test]
    async fn request_carries_filtered_candidates_and_rules() {
        let (store, runner, semaphore) = harness();
        store
            .set_executors(vec![
                executor("first-rep", "lucid64"),
                executor("second-rep", ".Net"),
                executor("third-rep", "lucid64"),
            ])
            .await;

        run_start_auction(
            store.clone(),
            runner.clone(),
            semaphore,
            10,
            start_auction("lucid64"),
        )
        .await;

        let requests = runner.start_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].rep_guids, vec!["first-rep", "third-rep"]);
        assert_eq!(requests[0].rules.algorithm, "reserve_n_best");
        assert_eq!(requests[0].rules.max_bidding_pool_fraction, 0.2);
        assert_eq!(requests[0].rules.max_rounds, 10);
        assert_eq!(
            store.resolved_start_auctions().await,
            vec![start_auction("lucid64")]
        );
    }

    #[tokio::test]
    async fn stop_auction_uses_every_executor() {
        let (store, runner, _) = harness();
        store
            .set_executors(vec![
                executor("first-rep", "lucid64"),
                executor("second-rep", ".Net"),
            ])
            .await;

        run_stop_auction(store.clone(), runner.clone(), stop_auction()).await;

        let requests = runner.stop_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].rep_guids, vec!["first-rep", "second-rep"]);
        assert_eq!(store.resolved_stop_auctions().await, vec![stop_auction()]);
    }

    #[tokio::test]
    async fn runner_failure_still_resolves() {
        let (store, runner, semaphore) = harness();
        store.set_executors(vec![executor("first-rep", "lucid64")]).await;
        runner.fail_start_auctions("the auction failed").await;

        run_start_auction(
            store.clone(),
            runner.clone(),
            semaphore,
            10,
            start_auction("lucid64"),
        )
        .await;

        assert_eq!(
            store.resolved_start_auctions().await,
            vec![start_auction("lucid64")]
        );
    }
}
