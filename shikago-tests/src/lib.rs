//! Shikago Tests - integration tests across the broker crates.
//!
//! ## Test Organization
//!
//! - `node_tests`: topic creation, routing and fan-out through a [`Node`]
//! - `endpoint_tests`: the partition write endpoint over real TCP
//!
//! Unit tests live inline in each crate under `#[cfg(test)]`.
//!
//! [`Node`]: shikago_server::Node

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
