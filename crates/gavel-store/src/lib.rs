//! gavel-store — the auctioneer's boundary to the coordination store.
//!
//! The [`AuctioneerStore`] trait is the contract the auctioneer's control
//! loop depends on: lock maintenance, auction-event watches, the
//! claim/resolve handshake, and the executor registry snapshot. The
//! production implementation talks to a shared hierarchical key-value
//! store; this crate ships two in-process implementations:
//!
//! - [`MemoryStore`] — a functional single-process store, useful for
//!   single-node deployments and end-to-end tests
//! - [`fake::FakeStore`] — a fully controllable double for driving the
//!   control loop deterministically from tests
//!
//! # Architecture
//!
//! ```text
//! AuctioneerStore
//!   ├── maintain_lock  → LockHandle { states, releaser }
//!   ├── watch_*        → AuctionWatch { events, errors, cancel }
//!   ├── claim_* / resolve_*
//!   └── all_executors
//! ```

pub mod error;
pub mod fake;
pub mod memory;
pub mod store;
pub mod watch;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::AuctioneerStore;
pub use watch::{AuctionWatch, LockHandle, LockReleaser};
