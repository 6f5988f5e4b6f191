//! Shikago Core - Shared types for the Shikago broker.
//!
//! This crate holds the vocabulary every other Shikago crate speaks:
//! the persisted [`Message`] record, strongly-typed identifiers, the
//! normalized [`TopicName`], system [`Limits`] and the single [`Error`]
//! type returned by every fallible operation.
//!
//! # Design Principles
//!
//! - **Strongly-typed IDs**: a `MessageId` can never be passed where a
//!   `PartitionId` is expected
//! - **Explicit limits**: partition counts and payload sizes are bounded
//! - **No unsafe code**

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod limits;
mod message;
mod topic_name;
mod types;

pub use error::{Error, Result};
pub use limits::Limits;
pub use message::Message;
pub use topic_name::TopicName;
pub use types::{MessageId, PartitionId};
