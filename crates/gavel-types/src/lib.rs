//! gavel-types — domain models and the auction-runner contract.
//!
//! The types here are shared by every gavel crate:
//!
//! - Scheduling records ([`LrpStartAuction`], [`LrpStopAuction`]) and the
//!   executor registry entry ([`ExecutorPresence`])
//! - The auction protocol types exchanged with a bidder
//!   ([`StartAuctionRequest`], [`StopAuctionRequest`], their results, and
//!   [`StartAuctionRules`])
//! - The [`AuctionRunner`] trait — the pluggable bidding protocol
//!
//! The records are plain serializable data; identity for the store's
//! claim/resolve handshake is the whole record, so all of them are
//! `Eq + Hash`.

pub mod auction;
pub mod fake;
pub mod models;

pub use auction::{
    AuctionRunner, StartAuctionRequest, StartAuctionResult, StartAuctionRules,
    StopAuctionRequest, StopAuctionResult,
};
pub use models::{DesiredLrp, ExecutorPresence, LrpStartAuction, LrpStopAuction};
