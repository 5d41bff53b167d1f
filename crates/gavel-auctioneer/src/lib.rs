//! gavel-auctioneer — the cluster singleton that turns scheduling
//! events into auctions.
//!
//! One auctioneer replica per cluster holds the leader lock at a time.
//! The leader watches the coordination store for start-auction and
//! stop-auction events and, per event, claims it, gathers candidate
//! executors, runs the bidding protocol through the pluggable runner,
//! and resolves the event in the store.
//!
//! # Architecture
//!
//! ```text
//! Auctioneer::run
//!   ├── lock maintenance (AuctioneerStore::maintain_lock)
//!   │     └── lock ticks open/close the two watches
//!   ├── start-auction watch ──► start worker (semaphore-bounded)
//!   ├── stop-auction watch  ──► stop worker (unbounded)
//!   └── signal stream       ──► release lock, cancel watches, return
//! ```
//!
//! Workers run detached and are never cancelled: once a worker has
//! claimed an event it is guaranteed to attempt the resolve, even
//! across lock loss and shutdown.

pub mod auctioneer;
pub mod config;
pub mod error;
pub mod selector;
pub mod signal;
mod worker;

pub use auctioneer::Auctioneer;
pub use config::{Config, ConfigError};
pub use error::AuctioneerError;
pub use signal::Signal;
