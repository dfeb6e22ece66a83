//! TCP server for the station HTTP API.
//!
//! Each accepted connection runs on its own task with a
//! `Framed<TcpStream, HttpCodec>`. Requests on one connection are answered in
//! order; the connection stays open while the client asks for keep-alive and
//! keeps sending within the idle timeout. A request that fails to decode gets
//! an error response and the connection is closed. Connections past the cap
//! are answered with 503.
//!
//! # Example Usage
//!
//! ```no_run
//! use homestation_api::{ApiServer, Router};
//! use homestation_core::{FirmwareVariant, HttpConfig};
//! # use homestation_device::SharedDeviceStore;
//!
//! # async fn example(store: SharedDeviceStore) -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::new(store, FirmwareVariant::Full);
//! let server = ApiServer::bind(&HttpConfig::default(), router).await?;
//! println!("listening on {}", server.local_addr()?);
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! server.run(shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, watch};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use homestation_core::HttpConfig;

use crate::codec::HttpCodec;
use crate::http::{Response, Status};
use crate::router::Router;

/// Pause after a failed accept, so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Time a rejected client gets to send its request before the 503 goes out.
const REJECT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors that can occur during HTTP server operations
#[derive(Debug, Error)]
pub enum HttpServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec error while writing a response
    #[error("Codec error: {0}")]
    Codec(String),
}

/// HTTP server bound to a listening socket.
pub struct ApiServer {
    listener: TcpListener,
    router: Arc<Router>,
    connections: Arc<Semaphore>,
    max_connections: usize,
    idle_timeout: Duration,
}

impl ApiServer {
    /// Bind the listener. Port 0 picks a free port; see
    /// [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns [`HttpServerError::BindFailed`] if the address cannot be bound.
    pub async fn bind(config: &HttpConfig, router: Router) -> Result<Self, HttpServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| HttpServerError::BindFailed {
                addr: config.bind_addr,
                source,
            })?;

        let max_connections = config.max_connections.max(1);
        let idle_timeout = config.idle_timeout();
        info!(
            addr = %listener.local_addr()?,
            max_connections,
            idle_timeout_ms = idle_timeout.as_millis() as u64,
            variant = %router.variant(),
            "HTTP server listening"
        );

        Ok(Self {
            listener,
            router: Arc::new(router),
            connections: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            idle_timeout,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, HttpServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` becomes `true` or its sender is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener itself fails.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), HttpServerError> {
        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            let (stream, addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let Ok(permit) = Arc::clone(&self.connections).try_acquire_owned() else {
                error!(
                    addr = %addr,
                    max_connections = self.max_connections,
                    "Connection rejected: maximum connections reached"
                );
                tokio::spawn(reject_busy(stream, addr));
                continue;
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }

            let router = Arc::clone(&self.router);
            let shutdown = shutdown.clone();
            let idle_timeout = self.idle_timeout;
            tokio::spawn(async move {
                let connection = Connection::new(stream, addr, idle_timeout);
                if let Err(e) = connection.serve(&router, shutdown).await {
                    debug!(addr = %addr, error = %e, "Connection ended with error");
                }
                drop(permit);
            });
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Answer a client over the connection cap with 503 and close.
///
/// The request is read first so the close does not reset the connection
/// before the client has seen the reply.
async fn reject_busy(stream: TcpStream, addr: SocketAddr) {
    let mut framed = Framed::new(stream, HttpCodec::new());
    let _ = tokio::time::timeout(REJECT_READ_TIMEOUT, framed.next()).await;

    let response = Response::text(Status::ServiceUnavailable, "Too many connections")
        .with_header("Retry-After", "1")
        .closing();
    if let Err(e) = framed.send(response).await {
        debug!(addr = %addr, error = %e, "Failed to send 503");
    }
}

/// One client connection.
struct Connection {
    framed: Framed<TcpStream, HttpCodec>,
    addr: SocketAddr,
    idle_timeout: Duration,
    connected_at: DateTime<Utc>,
    requests: u64,
}

impl Connection {
    fn new(stream: TcpStream, addr: SocketAddr, idle_timeout: Duration) -> Self {
        debug!(addr = %addr, "Accepted connection");
        Self {
            framed: Framed::new(stream, HttpCodec::new()),
            addr,
            idle_timeout,
            connected_at: Utc::now(),
            requests: 0,
        }
    }

    async fn serve(
        mut self,
        router: &Router,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), HttpServerError> {
        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(self.idle_timeout, self.framed.next()) => match next {
                    Ok(next) => next,
                    Err(_) => {
                        debug!(addr = %self.addr, "Idle timeout");
                        break;
                    }
                },
                _ = shutdown.changed() => break,
            };

            match next {
                None => break,
                Some(Ok(request)) => {
                    self.requests += 1;
                    let keep_alive = request.keep_alive();
                    let mut response = router.handle(&request).await;
                    if !keep_alive {
                        response = response.closing();
                    }
                    self.send(response).await?;
                    if !keep_alive {
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(addr = %self.addr, error = %e, "Rejecting request");
                    let response = Response::from_error(&e).closing();
                    self.send(response).await?;
                    break;
                }
            }
        }

        debug!(
            addr = %self.addr,
            requests = self.requests,
            uptime_ms = (Utc::now() - self.connected_at).num_milliseconds(),
            "Connection closed"
        );
        Ok(())
    }

    async fn send(&mut self, response: Response) -> Result<(), HttpServerError> {
        self.framed
            .send(response)
            .await
            .map_err(|e| HttpServerError::Codec(e.to_string()))
    }
}
