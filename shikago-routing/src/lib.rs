//! Shikago Routing - Partition selection for topic writes.
//!
//! A routing strategy maps a payload to a partition index in
//! `[0, partition_count)`. One strategy instance serves one topic; it holds
//! only the cursor state needed to pick the next partition.
//!
//! # Strategies
//!
//! - [`RoundRobin`]: cycles through partitions with an atomic cursor
//! - [`PayloadHash`]: hashes the payload so equal payloads co-locate

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod payload_hash;
mod round_robin;
mod strategy;

pub use payload_hash::PayloadHash;
pub use round_robin::RoundRobin;
pub use strategy::RoutingStrategy;
