//! Interactive stdin console for a single topic.
//!
//! Registers one all-partitions consumer plus one consumer per partition
//! (least-loaded subscription hands each a different partition), then
//! writes every line read from stdin to the topic.

use std::sync::Arc;

use shikago_core::{Message, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::node::Node;

/// Runs the console until stdin closes.
///
/// # Errors
/// Returns an error if the topic cannot be created or subscribed to.
pub async fn run(node: Arc<Node>, topic: &str) -> Result<()> {
    let all = node.subscribe_to_all(topic).await?;
    tokio::spawn(consume("all consumer".to_string(), all));

    let partition_count = node.get_or_create_topic(topic).await?.partition_count();
    for index in 0..partition_count {
        let incoming = node.subscribe(topic).await?;
        tokio::spawn(consume(format!("consumer-{index}"), incoming));
    }

    info!(topic, partitions = partition_count, "Console ready, type a line to write it");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read from stdin");
                break;
            }
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if let Err(e) = node.write(topic, text).await {
            warn!(topic, error = %e, "Console write failed");
        }
    }

    info!("Console input closed");
    Ok(())
}

async fn consume(name: String, mut incoming: mpsc::Receiver<Message>) {
    println!("Starting {name}");
    while let Some(msg) = incoming.recv().await {
        println!("{name} - msg {}: {}", msg.id.get(), msg.payload);
    }
}
