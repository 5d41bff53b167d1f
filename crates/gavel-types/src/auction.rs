//! The auction protocol: requests handed to a bidder and the results it
//! returns, plus the [`AuctionRunner`] trait the bidder implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{LrpStartAuction, LrpStopAuction};

/// Tuning knobs for a start-auction bidding round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAuctionRules {
    /// Name of the bidding algorithm the runner should use.
    pub algorithm: String,
    /// Fraction (0, 1] of the candidate pool invited to bid each round.
    pub max_bidding_pool_fraction: f64,
    /// Cap on bidding rounds before the runner gives up.
    pub max_rounds: u32,
}

impl Default for StartAuctionRules {
    fn default() -> Self {
        Self {
            algorithm: "reserve_n_best".to_string(),
            max_bidding_pool_fraction: 0.2,
            max_rounds: 40,
        }
    }
}

/// Everything a runner needs to auction off one start-auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAuctionRequest {
    pub start_auction: LrpStartAuction,
    /// Candidate executor IDs, already filtered for stack compatibility.
    pub rep_guids: Vec<String>,
    pub rules: StartAuctionRules,
}

/// Outcome of a start-auction. Informational only; the auctioneer
/// resolves the event regardless of what the runner reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartAuctionResult {
    pub winner: String,
    pub num_rounds: u32,
}

/// Everything a runner needs to auction off one stop-auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopAuctionRequest {
    pub stop_auction: LrpStopAuction,
    /// The full registered executor set; stop-auctions are unfiltered.
    pub rep_guids: Vec<String>,
}

/// Outcome of a stop-auction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopAuctionResult {
    /// The instance left standing.
    pub winner: String,
}

/// The pluggable bidding protocol.
///
/// Implementations are invoked concurrently from many auction workers
/// and must be safe for concurrent use. Errors are logged by the caller
/// and do not affect the claim/resolve handshake.
#[async_trait]
pub trait AuctionRunner: Send + Sync + 'static {
    async fn run_lrp_start_auction(
        &self,
        request: StartAuctionRequest,
    ) -> anyhow::Result<StartAuctionResult>;

    async fn run_lrp_stop_auction(
        &self,
        request: StopAuctionRequest,
    ) -> anyhow::Result<StopAuctionResult>;
}
