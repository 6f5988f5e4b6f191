//! The persisted message record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::MessageId;

/// A message accepted by a partition.
///
/// The `id` is unique and increasing within one partition only. It is
/// assigned by the partition at write time. Messages are immutable and are
/// handed to subscribers by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Per-partition sequence number.
    pub id: MessageId,
    /// The payload as written by the producer.
    pub payload: String,
    /// When the partition accepted the write.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(id: MessageId, payload: String) -> Self {
        Self {
            id,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Encodes the message as one newline-terminated JSON line.
    ///
    /// # Errors
    /// Returns a storage error if serialization fails.
    pub fn to_json_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self).map_err(|e| Error::storage("encode", e))?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decodes a message from one JSON line (trailing newline optional).
    ///
    /// # Errors
    /// Returns a validation error if the line is not a message record.
    pub fn from_json_line(line: &[u8]) -> Result<Self> {
        serde_json::from_slice(line.trim_ascii_end())
            .map_err(|e| Error::validation(format!("invalid message record: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_has_record_fields() {
        let msg = Message::new(MessageId::new(3), "hello".to_string());
        let line = msg.to_json_line().unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);

        let value: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["payload"], "hello");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_payload_with_newline_stays_on_one_line() {
        let msg = Message::new(MessageId::new(1), "a\nb".to_string());
        let line = msg.to_json_line().unwrap();
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(Message::from_json_line(&line).unwrap(), msg);
    }

    #[test]
    fn test_rejects_garbage_line() {
        let err = Message::from_json_line(b"not json").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
