//! Placeholder for partitions owned by another node.
//!
//! Clustering is not implemented. The type exists so a topic can be
//! assembled from mixed partition kinds once it is. Until then writes
//! report `Unsupported` and everything else is a no-op.

use async_trait::async_trait;
use shikago_core::{Error, Message, MessageId, Result};
use tokio::sync::mpsc;
use tracing::warn;

use crate::partition::Partition;

/// A partition hosted by a remote node.
#[derive(Debug, Clone)]
pub struct RemotePartition {
    address: String,
}

impl RemotePartition {
    /// Creates a stub for the partition served at `address`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Returns the remote address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Partition for RemotePartition {
    async fn write(&self, _payload: String) -> Result<Message> {
        Err(Error::Unsupported {
            operation: "remote partition write",
        })
    }

    fn subscribe(&self, _subscriber: mpsc::Sender<Message>) {
        warn!(address = %self.address, "Ignoring subscription to remote partition");
    }

    fn subscriber_count(&self) -> usize {
        0
    }

    fn last_id(&self) -> MessageId {
        MessageId::new(0)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remote_write_is_unsupported() {
        let partition = RemotePartition::new("10.0.0.2:8080");
        let err = partition.write("x".to_string()).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        assert_eq!(partition.address(), "10.0.0.2:8080");
    }

    #[tokio::test]
    async fn test_remote_subscribe_and_close_are_noops() {
        let partition = RemotePartition::new("10.0.0.2:8080");
        let (tx, _rx) = mpsc::channel(1);
        partition.subscribe(tx);
        assert_eq!(partition.subscriber_count(), 0);
        assert!(partition.close().await.is_ok());
    }
}
