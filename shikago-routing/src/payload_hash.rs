//! Payload-hash routing.

use shikago_core::{PartitionId, Result};
use xxhash_rust::xxh3::xxh3_64;

use crate::strategy::{check_partition_count, RoutingStrategy};

/// Routes each payload by its xxHash, so identical payloads always land
/// on the same partition.
#[derive(Debug)]
pub struct PayloadHash {
    partition_count: u64,
}

impl PayloadHash {
    /// Creates a strategy for `partition_count` partitions.
    ///
    /// # Errors
    /// Returns a configuration error if `partition_count` is zero.
    pub fn new(partition_count: u32) -> Result<Self> {
        Ok(Self {
            partition_count: check_partition_count(partition_count)?,
        })
    }
}

impl RoutingStrategy for PayloadHash {
    fn which_partition(&self, payload: &str) -> PartitionId {
        PartitionId::new(xxh3_64(payload.as_bytes()) % self.partition_count)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn partition_count(&self) -> u32 {
        self.partition_count as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shikago_core::Error;

    #[test]
    fn test_zero_partitions_rejected() {
        assert!(matches!(
            PayloadHash::new(0),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_same_payload_same_partition() {
        let strategy = PayloadHash::new(8).unwrap();
        let first = strategy.which_partition("user-42");
        for _ in 0..10 {
            assert_eq!(strategy.which_partition("user-42"), first);
        }
        assert!(first.get() < 8);
    }

    #[test]
    fn test_results_stay_in_range() {
        let strategy = PayloadHash::new(3).unwrap();
        for i in 0..100 {
            let partition = strategy.which_partition(&format!("payload-{i}"));
            assert!(partition.get() < 3);
        }
    }
}
