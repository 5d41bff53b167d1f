//! Scheduling records consumed and produced by the coordination store.
//!
//! These mirror the store's on-wire JSON. Identity for claim/resolve is
//! the whole record (the store deduplicates), so everything here derives
//! `Eq` and `Hash` and carries no floating-point fields.

use serde::{Deserialize, Serialize};

/// Descriptor of a long-running process to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesiredLrp {
    pub process_guid: String,
    /// Platform/compatibility tag. An LRP can only run on executors
    /// advertising the same stack.
    pub stack: String,
    /// Desired instance count for the process.
    pub instances: u32,
    pub memory_mb: u32,
    pub disk_mb: u32,
}

/// Request to place one new instance of an LRP on some executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LrpStartAuction {
    pub desired_lrp: DesiredLrp,
    /// Guid assigned to the instance this auction will place.
    pub instance_guid: String,
    /// Instance index within the process.
    pub index: u32,
    /// Availability-zone count hint for the bidding protocol.
    pub num_azs: u32,
}

/// Request to converge duplicate instances of an LRP down to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LrpStopAuction {
    pub process_guid: String,
    pub index: u32,
    /// Instance count the process should converge to.
    pub num_instances: u32,
    pub num_azs: u32,
}

/// An executor advertised in the store's registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutorPresence {
    pub executor_id: String,
    pub stack: String,
}
