//! The process-wide topic registry.
//!
//! A node creates topics lazily on first write or subscribe, sizing them
//! with the configured default partition count. Topic creation is
//! serialized by one creation lock, so concurrent first use of a topic
//! yields exactly one partition set. Lookups of existing topics only take
//! a shared read lock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use shikago_core::{Error, Limits, Message, PartitionId, Result, TopicName};
use shikago_partition::Topic;
use shikago_routing::{RoundRobin, RoutingStrategy};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::NodeConfig;

/// A single broker node.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    limits: Limits,
    /// Created topics by normalized name.
    topics: RwLock<HashMap<TopicName, Arc<Topic>>>,
    /// Held while a topic is being created.
    creation: Mutex<()>,
    /// Strategies registered for topics, applied on creation.
    strategies: std::sync::RwLock<HashMap<TopicName, Arc<dyn RoutingStrategy>>>,
}

impl Node {
    /// Creates a node, making sure the data directory exists.
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings, or a storage
    /// error if the data directory cannot be created.
    pub async fn open(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.data_directory)
            .await
            .map_err(|e| {
                Error::storage(
                    "create_dir",
                    format!("{}: {e}", config.data_directory.display()),
                )
            })?;

        info!(
            data_directory = %config.data_directory.display(),
            default_partition_count = config.default_partition_count,
            "Node started"
        );

        Ok(Self {
            config,
            limits: Limits::new(),
            topics: RwLock::new(HashMap::new()),
            creation: Mutex::new(()),
            strategies: std::sync::RwLock::new(HashMap::new()),
        })
    }

    /// Returns the node configuration.
    #[must_use]
    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Returns an existing topic without creating it.
    pub async fn topic(&self, name: &str) -> Option<Arc<Topic>> {
        let name = TopicName::new(name).ok()?;
        self.topics.read().await.get(&name).cloned()
    }

    /// Returns the names of all created topics, sorted.
    pub async fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .topics
            .read()
            .await
            .keys()
            .map(ToString::to_string)
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns the topic, creating it with the default partition count if
    /// this is its first use.
    ///
    /// # Errors
    /// Returns a validation error for an empty name, or the error that
    /// aborted topic creation. A failed creation registers nothing.
    pub async fn get_or_create_topic(&self, name: &str) -> Result<Arc<Topic>> {
        let name = TopicName::new(name)?;
        if let Some(topic) = self.topics.read().await.get(&name) {
            return Ok(Arc::clone(topic));
        }

        let _creating = self.creation.lock().await;
        // Another caller may have won the race while we waited.
        if let Some(topic) = self.topics.read().await.get(&name) {
            return Ok(Arc::clone(topic));
        }

        info!(topic = %name, "The topic is new, creating it locally");
        let partition_count = self.config.default_partition_count;
        let strategy = match self.registered_strategy(&name) {
            Some(strategy) => strategy,
            None => Arc::new(RoundRobin::new(partition_count)?),
        };

        let topic = Arc::new(
            Topic::open(
                &self.config.data_directory,
                name.clone(),
                partition_count,
                strategy,
            )
            .await?,
        );
        self.topics.write().await.insert(name, Arc::clone(&topic));
        Ok(topic)
    }

    /// Writes a payload to the topic, routed by the topic's strategy.
    ///
    /// # Errors
    /// Returns a validation error for an empty topic name or oversized
    /// payload, otherwise the topic's write error.
    pub async fn write(&self, topic: &str, payload: impl Into<String>) -> Result<Message> {
        let payload = payload.into();
        self.check_payload(&payload)?;
        let topic = self.get_or_create_topic(topic).await?;
        topic.write(payload).await
    }

    /// Writes to an explicit partition of an existing topic.
    ///
    /// Checks, in order: the topic exists (it is never created here), the
    /// index parses as a non-negative integer, the index is in range.
    ///
    /// # Errors
    /// Returns `UnknownTopic` or `Validation` for the failed check, or the
    /// partition's write error.
    pub async fn write_to_partition(
        &self,
        topic: &str,
        partition: &str,
        payload: impl Into<String>,
    ) -> Result<Message> {
        let resolved = self.topic(topic).await.ok_or_else(|| Error::UnknownTopic {
            topic: topic.to_string(),
        })?;

        let index: u64 = partition.parse().map_err(|_| {
            Error::validation(format!("The partition index {partition} is invalid"))
        })?;

        let payload = payload.into();
        self.check_payload(&payload)?;
        resolved.write_to(PartitionId::new(index), payload).await
    }

    /// Subscribes to the least-loaded partition of the topic.
    ///
    /// # Errors
    /// Returns an error if the topic cannot be resolved or created.
    pub async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Message>> {
        let topic = self.get_or_create_topic(topic).await?;
        let (tx, rx) = mpsc::channel(self.config.subscriber_buffer);
        topic.subscribe(tx);
        Ok(rx)
    }

    /// Subscribes to every partition of the topic.
    ///
    /// # Errors
    /// Returns an error if the topic cannot be resolved or created.
    pub async fn subscribe_to_all(&self, topic: &str) -> Result<mpsc::Receiver<Message>> {
        let topic = self.get_or_create_topic(topic).await?;
        let (tx, rx) = mpsc::channel(self.config.subscriber_buffer);
        topic.subscribe_to_all(&tx);
        Ok(rx)
    }

    /// Sets the routing strategy for a topic.
    ///
    /// Takes effect from the next write. If the topic does not exist yet,
    /// the strategy is used when it is created.
    ///
    /// # Errors
    /// Returns a validation error for an empty topic name.
    pub async fn register_strategy(
        &self,
        topic: &str,
        strategy: Arc<dyn RoutingStrategy>,
    ) -> Result<()> {
        let name = TopicName::new(topic)?;
        // Holding the creation lock keeps a concurrent creation from
        // missing the new strategy.
        let _creating = self.creation.lock().await;

        if let Some(existing) = self.topics.read().await.get(&name) {
            existing.set_strategy(Arc::clone(&strategy));
        }
        debug!(topic = %name, strategy = ?strategy, "Registered routing strategy");
        self.strategies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, strategy);
        Ok(())
    }

    /// Closes every topic.
    ///
    /// Not coordinated with in-flight operations: callers stop producers
    /// first. Every topic is attempted even if one fails.
    ///
    /// # Errors
    /// Returns the first close error encountered.
    pub async fn shutdown(&self) -> Result<()> {
        let topics: Vec<Arc<Topic>> = self.topics.read().await.values().cloned().collect();
        info!(topics = topics.len(), "Starting shutdown");

        let mut first_error = None;
        for topic in topics {
            if let Err(e) = topic.close().await {
                warn!(topic = %topic.name(), error = %e, "Failed to close topic");
                first_error.get_or_insert(e);
            }
        }

        info!("Finished closing all the partitions");
        first_error.map_or(Ok(()), Err)
    }

    fn registered_strategy(&self, name: &TopicName) -> Option<Arc<dyn RoutingStrategy>> {
        self.strategies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn check_payload(&self, payload: &str) -> Result<()> {
        if payload.len() > self.limits.payload_bytes_max {
            return Err(Error::validation(format!(
                "payload of {} bytes exceeds limit of {} bytes",
                payload.len(),
                self.limits.payload_bytes_max
            )));
        }
        Ok(())
    }
}
