//! Shikago Partition - Append-only partitions and topics.
//!
//! A partition is an independently ordered, independently persisted
//! sub-log of a topic. Each write is assigned the next per-partition
//! sequence id, appended as one JSON line to the partition's file, and
//! then fanned out to every registered subscriber.
//!
//! # Design
//!
//! - [`Partition`]: the capability every partition kind provides
//! - [`LocalPartition`]: a partition backed by a single `.jsonl` file
//! - [`RemotePartition`]: placeholder for partitions owned by another node
//! - [`Topic`]: a fixed, ordered set of partitions plus a routing strategy
//!
//! # Delivery
//!
//! Subscribers register a bounded `tokio::sync::mpsc::Sender`. Every
//! registration gets its own forwarding task, so a writer returns as soon
//! as its append succeeds and a slow subscriber only delays itself.
//! Delivery is at-most-once and failures never reach the writer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod local;
mod partition;
mod remote;
mod subscriber;
mod topic;

pub use local::LocalPartition;
pub use partition::Partition;
pub use remote::RemotePartition;
pub use topic::Topic;
