//! Shikago broker node.
//!
//! This crate wires partitions and topics into a process-wide [`Node`]
//! and exposes the partition-addressed write endpoint over HTTP:
//!
//! ```text
//! POST /partition/{topic}/{partition_index}   body = raw payload
//! ```
//!
//! Writes through [`Node::write`] are routed by the topic's strategy;
//! writes through the endpoint name their partition explicitly.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod config;
pub mod console;
mod endpoint;
mod error;
mod node;

pub use config::NodeConfig;
pub use endpoint::{EndpointServer, PartitionPath};
pub use error::{EndpointError, EndpointResult};
pub use node::Node;
