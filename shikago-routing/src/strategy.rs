//! The routing strategy contract.

use std::fmt;

use shikago_core::{Error, PartitionId, Result};

/// Selects the partition that receives a write.
///
/// Implementations must be safe to call from many writers at once.
pub trait RoutingStrategy: Send + Sync + fmt::Debug {
    /// Returns the partition for this payload, in `[0, partition_count)`.
    fn which_partition(&self, payload: &str) -> PartitionId;

    /// Returns the partition count this strategy was sized for.
    fn partition_count(&self) -> u32;
}

/// Rejects a zero partition count before any strategy can divide by it.
pub(crate) fn check_partition_count(partition_count: u32) -> Result<u64> {
    if partition_count == 0 {
        return Err(Error::configuration(
            "routing strategy needs at least one partition",
        ));
    }
    Ok(u64::from(partition_count))
}
