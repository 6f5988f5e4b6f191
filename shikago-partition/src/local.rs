//! File-backed partition.
//!
//! Each partition owns one `.jsonl` file, recreated empty on open. Every
//! accepted message becomes one line `{"id":..,"payload":..,"timestamp":..}`
//! and lines appear in strictly increasing id order.

use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use shikago_core::{Error, Message, MessageId, Result};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::partition::Partition;
use crate::subscriber::SubscriberSet;

/// The open backing file and its length in bytes.
#[derive(Debug)]
struct LogFile {
    file: File,
    len: u64,
}

impl LogFile {
    /// Drops bytes past the last complete record and moves the write
    /// position back to the end of it.
    async fn rollback(&mut self) -> std::io::Result<()> {
        self.file.set_len(self.len).await?;
        self.file.seek(SeekFrom::Start(self.len)).await?;
        Ok(())
    }
}

/// A partition persisted to a local file.
#[derive(Debug)]
pub struct LocalPartition {
    /// Path of the backing file.
    path: PathBuf,
    /// Append lock. `None` once closed.
    log: Mutex<Option<LogFile>>,
    /// Last assigned sequence id.
    sequence: AtomicU64,
    /// Registered subscribers.
    subscribers: SubscriberSet,
}

impl LocalPartition {
    /// Creates (or truncates) the backing file at `path`.
    ///
    /// # Errors
    /// Returns a storage error if the file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)
            .await
            .map_err(|e| Error::storage("create", format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), "Created local partition");

        Ok(Self {
            path,
            log: Mutex::new(Some(LogFile { file, len: 0 })),
            sequence: AtomicU64::new(0),
            subscribers: SubscriberSet::default(),
        })
    }

    /// Appends one encoded record, rolling back partial bytes on failure.
    async fn append(log: &mut LogFile, line: &[u8]) -> Result<()> {
        let result = async {
            log.file.write_all(line).await?;
            log.file.flush().await
        }
        .await;

        match result {
            Ok(()) => {
                log.len += line.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = log.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back partial append");
                }
                Err(Error::storage("append", e))
            }
        }
    }
}

#[async_trait]
impl Partition for LocalPartition {
    async fn write(&self, payload: String) -> Result<Message> {
        // The append lock spans id assignment, append and fan-out so that
        // file order, id order and delivery order agree.
        let mut guard = self.log.lock().await;
        let Some(log) = guard.as_mut() else {
            return Err(Error::storage("append", "partition is closed"));
        };

        let id = MessageId::new(self.sequence.fetch_add(1, Ordering::AcqRel) + 1);
        let message = Message::new(id, payload);

        let appended = match message.to_json_line() {
            Ok(line) => Self::append(log, &line).await,
            Err(e) => Err(e),
        };
        if let Err(e) = appended {
            // Nothing was persisted; hand the id back.
            self.sequence.fetch_sub(1, Ordering::AcqRel);
            warn!(path = %self.path.display(), error = %e, "Partition write failed");
            return Err(e);
        }

        self.subscribers.fan_out(&message);
        drop(guard);

        debug!(path = %self.path.display(), id = id.get(), "Appended message");
        Ok(message)
    }

    fn subscribe(&self, subscriber: mpsc::Sender<Message>) {
        self.subscribers.register(subscriber);
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn last_id(&self) -> MessageId {
        MessageId::new(self.sequence.load(Ordering::Acquire))
    }

    async fn close(&self) -> Result<()> {
        let Some(mut log) = self.log.lock().await.take() else {
            return Ok(());
        };

        log.file
            .flush()
            .await
            .map_err(|e| Error::storage("close", e))?;
        log.file
            .sync_all()
            .await
            .map_err(|e| Error::storage("close", e))?;

        debug!(path = %self.path.display(), "Closed local partition");
        Ok(())
    }
}
