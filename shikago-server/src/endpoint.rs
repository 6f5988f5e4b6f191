//! Partition-addressed write endpoint.
//!
//! Serves `POST /partition/{topic}/{partition_index}` over HTTP/1.1. The
//! raw request body becomes the message payload and is written straight to
//! the named partition, bypassing the topic's routing strategy. Topics are
//! never created through this path.
//!
//! Request failures are answered with a plain-text reason:
//!
//! | Failure                          | Status |
//! |----------------------------------|--------|
//! | method other than POST           | 405    |
//! | path not of the form above       | 404    |
//! | topic unknown to this node       | 404    |
//! | index not an integer or too big  | 400    |
//! | body over the payload limit      | 413    |
//! | storage or other broker failure  | 500    |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use shikago_core::{Error, Limits};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::error::{EndpointError, EndpointResult};
use crate::node::Node;

/// Path prefix of the write endpoint.
const PARTITION_PATH_PREFIX: &str = "/partition/";

/// A parsed `/partition/{topic}/{partition}` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPath<'a> {
    /// Topic segment, matching `[A-Za-z0-9_.-]+`.
    pub topic: &'a str,
    /// Partition segment, matching `[A-Za-z0-9]+`. Not yet parsed.
    pub partition: &'a str,
}

impl<'a> PartitionPath<'a> {
    /// Parses a request path, returning `None` if it does not match.
    #[must_use]
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix(PARTITION_PATH_PREFIX)?;
        let (topic, partition) = rest.split_once('/')?;

        let topic_ok = !topic.is_empty()
            && topic
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        let partition_ok =
            !partition.is_empty() && partition.bytes().all(|b| b.is_ascii_alphanumeric());

        (topic_ok && partition_ok).then_some(Self { topic, partition })
    }
}

/// HTTP server for the write endpoint.
#[derive(Debug)]
pub struct EndpointServer {
    node: Arc<Node>,
    listener: TcpListener,
    limits: Limits,
    shutdown: Arc<Notify>,
}

impl EndpointServer {
    /// Binds the endpoint to `addr`. Use port 0 for an ephemeral port.
    ///
    /// # Errors
    /// Returns `EndpointError::Bind` if the address cannot be bound.
    pub async fn bind(node: Arc<Node>, addr: SocketAddr) -> EndpointResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| EndpointError::Bind { addr, source })?;

        Ok(Self {
            node,
            listener,
            limits: Limits::new(),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Returns the bound address.
    ///
    /// # Errors
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> EndpointResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns a handle that stops [`run`](Self::run) when notified.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Serves connections until shutdown is signaled.
    ///
    /// Each connection runs on its own task. Accept failures are logged
    /// and the loop continues.
    pub async fn run(self) {
        let addr = self.listener.local_addr().ok();
        info!(addr = ?addr, "Partition endpoint listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let node = Arc::clone(&self.node);
                            let limits = self.limits;
                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    let node = Arc::clone(&node);
                                    async move {
                                        Ok::<_, Infallible>(handle_request(&node, limits, req).await)
                                    }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(TokioIo::new(stream), service)
                                    .await
                                {
                                    debug!(peer = %peer, error = %e, "Connection ended with error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Partition endpoint shutting down");
                    break;
                }
            }
        }
    }
}

/// Handles one request end to end.
async fn handle_request(
    node: &Node,
    limits: Limits,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    if req.method() != Method::POST {
        return fail(
            StatusCode::METHOD_NOT_ALLOWED,
            &format!("Invalid request method {}", req.method()),
        );
    }

    let path = req.uri().path().to_string();
    let Some(target) = PartitionPath::parse(&path) else {
        return fail(StatusCode::NOT_FOUND, &format!("Unknown endpoint: {path}"));
    };

    let body = match Limited::new(req.into_body(), limits.payload_bytes_max)
        .collect()
        .await
    {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return fail(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "Request body exceeds {} bytes",
                    limits.payload_bytes_max
                ),
            );
        }
        Err(e) => {
            return fail(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}"));
        }
    };

    write_addressed(node, target, &body).await
}

/// Writes `body` to the addressed partition and builds the response.
async fn write_addressed(
    node: &Node,
    target: PartitionPath<'_>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    debug!(topic = target.topic, partition = target.partition, "Pushing data to partition");

    let payload = String::from_utf8_lossy(body).into_owned();
    match node
        .write_to_partition(target.topic, target.partition, payload)
        .await
    {
        Ok(message) => {
            debug!(
                topic = target.topic,
                partition = target.partition,
                id = message.id.get(),
                "Wrote to partition"
            );
            match serde_json::to_vec(&message) {
                Ok(json) => Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Full::new(Bytes::from(json)))
                    .unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))),
                // The message is persisted; only the echo failed.
                Err(_) => Response::new(Full::new(Bytes::new())),
            }
        }
        Err(e) => fail(status_for(&e), &e.to_string()),
    }
}

/// Maps a broker error to an HTTP status.
const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::UnknownTopic { .. } => StatusCode::NOT_FOUND,
        Error::Configuration { .. } | Error::Storage { .. } | Error::Unsupported { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Logs and builds a plain-text failure response.
fn fail(status: StatusCode, reason: &str) -> Response<Full<Bytes>> {
    warn!(status = status.as_u16(), reason, "Rejected endpoint request");
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(reason.to_string())))
        .unwrap_or_else(|_| {
            let mut resp = Response::new(Full::new(Bytes::from(reason.to_string())));
            *resp.status_mut() = status;
            resp
        })
}
