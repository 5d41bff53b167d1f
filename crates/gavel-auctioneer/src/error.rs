//! Auctioneer error types.

use thiserror::Error;

use gavel_store::StoreError;

use crate::config::ConfigError;

/// Fatal errors returned from [`Auctioneer::run`].
///
/// Everything else — lock loss, watch faults, claim conflicts, runner
/// failures — is recovered or logged in place; the loop only ever
/// returns an error before it has started watching.
///
/// [`Auctioneer::run`]: crate::Auctioneer::run
#[derive(Debug, Error)]
pub enum AuctioneerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start lock maintenance: {0}")]
    Lock(#[source] StoreError),
}
