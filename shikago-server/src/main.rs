//! Shikago broker server binary.
//!
//! Starts a node and its partition write endpoint:
//!
//! ```bash
//! shikago-server --config node.json
//! ```
//!
//! With `--console <topic>`, lines typed on stdin are written to the topic
//! and every delivery is printed:
//!
//! ```bash
//! shikago-server --data-dir /tmp/shikago --console clicks
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use shikago_server::{console, EndpointServer, Node, NodeConfig};

/// Shikago partitioned publish/subscribe broker.
#[derive(Parser, Debug)]
#[command(name = "shikago-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (`.json` or `.toml`). Defaults apply if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port for the partition write endpoint. Overrides the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Directory for partition files. Overrides the config file.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Run an interactive stdin console against this topic.
    #[arg(long)]
    console: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Stdout belongs to the console; logs go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(port) = args.port {
        config = config.with_node_port(port);
    }
    if let Some(data_dir) = args.data_dir {
        config = config.with_data_directory(data_dir);
    }

    let node = Arc::new(Node::open(config).await?);
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, node.config().node_port));
    let endpoint = EndpointServer::bind(Arc::clone(&node), addr).await?;
    let endpoint_shutdown = endpoint.shutdown_handle();
    let endpoint_task = tokio::spawn(endpoint.run());

    if let Some(topic) = args.console {
        tokio::select! {
            result = console::run(Arc::clone(&node), &topic) => result?,
            signal = tokio::signal::ctrl_c() => signal?,
        }
    } else {
        tokio::signal::ctrl_c().await?;
    }

    info!("Shutting down");
    endpoint_shutdown.notify_one();
    endpoint_task.await?;
    node.shutdown().await?;

    Ok(())
}
