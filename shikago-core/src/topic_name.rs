//! Normalized topic names.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::PartitionId;

/// A topic name after normalization.
///
/// Normalization trims surrounding whitespace, lowercases, and replaces
/// each remaining whitespace character with `_`. Two spellings that
/// normalize to the same name refer to the same topic. The result is
/// limited to `[a-z0-9_.-]`, so it is always a plain file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicName(String);

impl TopicName {
    /// Normalizes a raw topic name.
    ///
    /// # Errors
    /// Returns a validation error if nothing remains after trimming, or if
    /// the result has characters outside `[a-z0-9_.-]` or is `.` or `..`.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("topic name cannot be empty"));
        }

        let normalized = trimmed
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect::<String>()
            .to_lowercase();

        // The name becomes a file name inside the data directory.
        let charset_ok = normalized.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-')
        });
        if !charset_ok || normalized == "." || normalized == ".." {
            return Err(Error::validation(format!(
                "topic name {raw:?} must match [a-z0-9_.-]+ and not be . or .."
            )));
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the backing file name for one partition of this topic.
    #[must_use]
    pub fn partition_file_name(&self, partition: PartitionId) -> String {
        format!("{}_{}.jsonl", self.0, partition.get())
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
