//! Candidate-executor selection.
//!
//! Start-auctions may only be bid on by executors advertising the
//! LRP's stack; stop-auctions go to the full registered set. An empty
//! candidate set is not an error — it means no compatible executor is
//! currently advertised.

use gavel_store::{AuctioneerStore, StoreResult};
use gavel_types::ExecutorPresence;

/// Executor IDs eligible to bid on a start-auction for `stack`.
pub async fn start_candidates<S>(store: &S, stack: &str) -> StoreResult<Vec<String>>
where
    S: AuctioneerStore,
{
    let executors = store.all_executors().await?;
    Ok(ids_for_stack(&executors, stack))
}

/// Executor IDs eligible to bid on a stop-auction: everyone.
pub async fn stop_candidates<S>(store: &S) -> StoreResult<Vec<String>>
where
    S: AuctioneerStore,
{
    let executors = store.all_executors().await?;
    Ok(all_ids(&executors))
}

/// Filter a registry snapshot down to executors of one stack.
pub fn ids_for_stack(executors: &[ExecutorPresence], stack: &str) -> Vec<String> {
    executors
        .iter()
        .filter(|executor| executor.stack == stack)
        .map(|executor| executor.executor_id.clone())
        .collect()
}

fn all_ids(executors: &[ExecutorPresence]) -> Vec<String> {
    executors
        .iter()
        .map(|executor| executor.executor_id.clone())
        .collect()
}
