//! System limits and configuration bounds.
//!
//! Every resource the broker hands out has an explicit maximum.

/// System-wide limits for Shikago.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of partitions a single topic may have.
    pub partitions_per_topic_max: u32,
    /// Maximum size of a single message payload in bytes.
    pub payload_bytes_max: usize,
}

impl Limits {
    /// Creates limits with safe defaults: 256 partitions, 1MB payloads.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            partitions_per_topic_max: 256,
            payload_bytes_max: 1024 * 1024,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}
