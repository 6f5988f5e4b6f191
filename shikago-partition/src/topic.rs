//! Topics: a named, fixed set of partitions.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use shikago_core::{Error, Limits, Message, PartitionId, Result, TopicName};
use shikago_routing::RoutingStrategy;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::local::LocalPartition;
use crate::partition::Partition;

/// A named stream split into a fixed number of partitions.
///
/// The partition count never changes after construction. The routing
/// strategy may be swapped at any time and applies from the next write.
#[derive(Debug)]
pub struct Topic {
    name: TopicName,
    partitions: Vec<Arc<dyn Partition>>,
    strategy: RwLock<Arc<dyn RoutingStrategy>>,
    /// Serializes least-loaded subscription so two callers don't both
    /// pick the same partition.
    subscribe_lock: Mutex<()>,
}

impl Topic {
    /// Creates `partition_count` local partitions under `data_dir`.
    ///
    /// Partition `i` is backed by `<name>_<i>.jsonl`. If any partition
    /// cannot be created, the ones already created are closed and the
    /// error is returned.
    ///
    /// # Errors
    /// Returns a configuration error for a zero or oversized partition
    /// count, or the storage error of the failing partition.
    pub async fn open(
        data_dir: &Path,
        name: TopicName,
        partition_count: u32,
        strategy: Arc<dyn RoutingStrategy>,
    ) -> Result<Self> {
        check_partition_count(partition_count)?;

        let mut partitions: Vec<Arc<dyn Partition>> = Vec::new();
        for index in 0..u64::from(partition_count) {
            let path = data_dir.join(name.partition_file_name(PartitionId::new(index)));
            match LocalPartition::open(path).await {
                Ok(partition) => partitions.push(Arc::new(partition)),
                Err(e) => {
                    warn!(topic = %name, partition = index, error = %e, "Failed to create partition");
                    close_all(&partitions).await;
                    return Err(e);
                }
            }
        }

        info!(topic = %name, partitions = partition_count, "Created topic");
        Self::from_partitions(name, partitions, strategy)
    }

    /// Assembles a topic from existing partitions of any kind.
    ///
    /// # Errors
    /// Returns a configuration error if `partitions` is empty or exceeds
    /// the partition limit.
    pub fn from_partitions(
        name: TopicName,
        partitions: Vec<Arc<dyn Partition>>,
        strategy: Arc<dyn RoutingStrategy>,
    ) -> Result<Self> {
        let count = u32::try_from(partitions.len())
            .map_err(|_| Error::configuration("too many partitions"))?;
        check_partition_count(count)?;

        Ok(Self {
            name,
            partitions,
            strategy: RwLock::new(strategy),
            subscribe_lock: Mutex::new(()),
        })
    }

    /// Returns the topic name.
    #[must_use]
    pub const fn name(&self) -> &TopicName {
        &self.name
    }

    /// Returns the number of partitions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn partition_count(&self) -> u32 {
        // Bounded by Limits::partitions_per_topic_max at construction.
        self.partitions.len() as u32
    }

    /// Returns the partition at `id`, if in range.
    #[must_use]
    pub fn partition(&self, id: PartitionId) -> Option<&Arc<dyn Partition>> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.partitions.get(index))
    }

    /// Returns the current routing strategy.
    #[must_use]
    pub fn strategy(&self) -> Arc<dyn RoutingStrategy> {
        Arc::clone(&self.strategy.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the routing strategy. Already-written messages stay put.
    pub fn set_strategy(&self, strategy: Arc<dyn RoutingStrategy>) {
        *self.strategy.write().unwrap_or_else(PoisonError::into_inner) = strategy;
    }

    /// Routes the payload to a partition and writes it there.
    ///
    /// # Errors
    /// Returns the partition's error unchanged, or a configuration error
    /// if the strategy picks a partition outside this topic.
    pub async fn write(&self, payload: String) -> Result<Message> {
        let target = self.strategy().which_partition(&payload);
        let partition = self.partition(target).ok_or_else(|| {
            Error::configuration(format!(
                "routing strategy for topic {} chose partition {} of {}",
                self.name,
                target.get(),
                self.partitions.len()
            ))
        })?;

        debug!(topic = %self.name, partition = target.get(), "Routing write");
        partition.write(payload).await
    }

    /// Writes directly to partition `target`, bypassing the strategy.
    ///
    /// # Errors
    /// Returns a validation error if `target` is out of range, otherwise
    /// the partition's error unchanged.
    pub async fn write_to(&self, target: PartitionId, payload: String) -> Result<Message> {
        let partition = self.partition(target).ok_or_else(|| {
            Error::validation(format!(
                "The partition index {} is invalid for topic {} with {} partitions",
                target.get(),
                self.name,
                self.partitions.len()
            ))
        })?;
        partition.write(payload).await
    }

    /// Registers `subscriber` on the partition with the fewest subscribers.
    ///
    /// Ties go to the lowest index. Returns the chosen partition.
    pub fn subscribe(&self, subscriber: mpsc::Sender<Message>) -> PartitionId {
        let _guard = self
            .subscribe_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Strict comparison keeps the first of equal minima.
        let mut index = 0;
        let mut fewest = usize::MAX;
        for (candidate, partition) in self.partitions.iter().enumerate() {
            let count = partition.subscriber_count();
            if count < fewest {
                index = candidate;
                fewest = count;
            }
        }

        self.partitions[index].subscribe(subscriber);
        let chosen = PartitionId::from_index(index);
        debug!(topic = %self.name, partition = chosen.get(), "Registered subscriber");
        chosen
    }

    /// Registers `subscriber` on every partition.
    ///
    /// Per-partition order is preserved; there is no order across
    /// partitions.
    pub fn subscribe_to_all(&self, subscriber: &mpsc::Sender<Message>) {
        for partition in &self.partitions {
            partition.subscribe(subscriber.clone());
        }
        debug!(topic = %self.name, "Registered subscriber on all partitions");
    }

    /// Returns the subscriber count of each partition, by index.
    #[must_use]
    pub fn subscriber_counts(&self) -> Vec<usize> {
        self.partitions
            .iter()
            .map(|partition| partition.subscriber_count())
            .collect()
    }

    /// Closes every partition.
    ///
    /// A failure does not stop the remaining closes.
    ///
    /// # Errors
    /// Returns the first error encountered.
    pub async fn close(&self) -> Result<()> {
        let mut first_error = None;
        for (index, partition) in self.partitions.iter().enumerate() {
            if let Err(e) = partition.close().await {
                warn!(topic = %self.name, partition = index, error = %e, "Failed to close partition");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn check_partition_count(partition_count: u32) -> Result<()> {
    let max = Limits::new().partitions_per_topic_max;
    if partition_count == 0 || partition_count > max {
        return Err(Error::configuration(format!(
            "partition count must be in [1, {max}], got {partition_count}"
        )));
    }
    Ok(())
}

async fn close_all(partitions: &[Arc<dyn Partition>]) {
    for partition in partitions {
        if let Err(e) = partition.close().await {
            warn!(error = %e, "Failed to close partition during cleanup");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shikago_core::MessageId;
    use shikago_routing::{PayloadHash, RoundRobin};
    use tokio::time::timeout;

    use super::*;
    use crate::remote::RemotePartition;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    async fn open_topic(dir: &Path, name: &str, partitions: u32) -> Topic {
        Topic::open(
            dir,
            TopicName::new(name).unwrap(),
            partitions,
            Arc::new(RoundRobin::new(partitions).unwrap()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_one_file_per_partition() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "Orders", 3).await;

        assert_eq!(topic.partition_count(), 3);
        for index in 0..3 {
            assert!(temp_dir.path().join(format!("orders_{index}.jsonl")).exists());
        }
    }

    #[tokio::test]
    async fn test_open_rejects_zero_partitions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Topic::open(
            temp_dir.path(),
            TopicName::new("t").unwrap(),
            0,
            Arc::new(RoundRobin::new(1).unwrap()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_open_fails_cleanly_when_directory_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope");
        let err = Topic::open(
            &missing,
            TopicName::new("t").unwrap(),
            2,
            Arc::new(RoundRobin::new(2).unwrap()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[tokio::test]
    async fn test_open_cleans_up_when_later_partition_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory where partition 1's file should go.
        std::fs::create_dir(temp_dir.path().join("t_1.jsonl")).unwrap();

        let err = Topic::open(
            temp_dir.path(),
            TopicName::new("t").unwrap(),
            3,
            Arc::new(RoundRobin::new(3).unwrap()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Storage { operation: "create", .. }));
        // Partition 0 was opened before the failure; creation stopped at 1.
        assert!(temp_dir.path().join("t_0.jsonl").is_file());
        assert!(!temp_dir.path().join("t_2.jsonl").exists());
    }

    #[tokio::test]
    async fn test_round_robin_writes_visit_partitions_in_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 3).await;

        for round in 1..=2u64 {
            for index in 0..3u64 {
                topic.write(format!("{round}-{index}")).await.unwrap();
                let partition = topic.partition(PartitionId::new(index)).unwrap();
                assert_eq!(partition.last_id(), MessageId::new(round));
            }
        }
    }

    #[tokio::test]
    async fn test_write_to_bypasses_routing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 2).await;

        topic.write_to(PartitionId::new(1), "a".to_string()).await.unwrap();
        topic.write_to(PartitionId::new(1), "b".to_string()).await.unwrap();

        assert_eq!(topic.partition(PartitionId::new(0)).unwrap().last_id().get(), 0);
        assert_eq!(topic.partition(PartitionId::new(1)).unwrap().last_id().get(), 2);

        let err = topic
            .write_to(PartitionId::new(2), "c".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_strategy_sized_for_more_partitions_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 1).await;
        topic.set_strategy(Arc::new(RoundRobin::new(4).unwrap()));

        // First pick is 0, second is 1 which is out of range.
        topic.write("a".to_string()).await.unwrap();
        let err = topic.write("b".to_string()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_set_strategy_applies_to_next_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 4).await;
        topic.set_strategy(Arc::new(PayloadHash::new(4).unwrap()));

        let expected = PayloadHash::new(4).unwrap().which_partition("key");
        for _ in 0..3 {
            topic.write("key".to_string()).await.unwrap();
        }
        assert_eq!(topic.partition(expected).unwrap().last_id().get(), 3);
    }

    #[tokio::test]
    async fn test_subscribe_picks_least_loaded_first_index_on_tie() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 2).await;

        let (tx, _rx) = mpsc::channel(1);
        assert_eq!(topic.subscribe(tx.clone()), PartitionId::new(0));
        assert_eq!(topic.subscribe(tx.clone()), PartitionId::new(1));
        assert_eq!(topic.subscribe(tx), PartitionId::new(0));
        assert_eq!(topic.subscriber_counts(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_subscribe_to_all_sees_every_partition() {
        let temp_dir = tempfile::tempdir().unwrap();
        let topic = open_topic(temp_dir.path(), "t", 2).await;

        let (tx, mut rx) = mpsc::channel(16);
        topic.subscribe_to_all(&tx);
        assert_eq!(topic.subscriber_counts(), vec![1, 1]);

        for i in 0..4 {
            topic.write(format!("m{i}")).await.unwrap();
        }

        let mut payloads = Vec::new();
        for _ in 0..4 {
            let msg = timeout(TEST_TIMEOUT, rx.recv()).await.unwrap().unwrap();
            payloads.push(msg.payload);
        }
        payloads.sort();
        assert_eq!(payloads, vec!["m0", "m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_topic_of_remote_partitions() {
        let partitions: Vec<Arc<dyn Partition>> = vec![
            Arc::new(RemotePartition::new("a:1")),
            Arc::new(RemotePartition::new("b:1")),
        ];
        let topic = Topic::from_partitions(
            TopicName::new("remote").unwrap(),
            partitions,
            Arc::new(RoundRobin::new(2).unwrap()),
        )
        .unwrap();

        assert!(topic.close().await.is_ok());
        let err = topic.write("x".to_string()).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
