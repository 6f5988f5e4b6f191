//! The partition capability.
//!
//! Local and remote partitions are interchangeable behind this trait; a
//! topic holds them as `Arc<dyn Partition>`.

use std::fmt;

use async_trait::async_trait;
use shikago_core::{Message, MessageId, Result};
use tokio::sync::mpsc;

/// An append-only log with subscriber fan-out.
#[async_trait]
pub trait Partition: Send + Sync + fmt::Debug {
    /// Assigns the next sequence id, persists the message, then delivers a
    /// copy to every registered subscriber.
    ///
    /// Returns once the message is persisted; delivery happens in the
    /// background.
    ///
    /// # Errors
    /// Returns the encode or append error. On error no subscriber is
    /// notified.
    async fn write(&self, payload: String) -> Result<Message>;

    /// Registers a delivery channel for every future write.
    ///
    /// Registrations last for the partition's lifetime. Must be called
    /// from within a Tokio runtime.
    fn subscribe(&self, subscriber: mpsc::Sender<Message>);

    /// Returns the number of registered subscribers.
    fn subscriber_count(&self) -> usize;

    /// Returns the most recently assigned id, or 0 before the first write.
    fn last_id(&self) -> MessageId;

    /// Releases the backing store.
    ///
    /// # Errors
    /// Returns a storage error if flushing or syncing fails.
    async fn close(&self) -> Result<()>;
}
