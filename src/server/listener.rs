//! Listener and Accept Loop
//!
//! [`LookupServer`] binds the listening socket, accepts connections, and
//! spawns one task per client running the session loop from the
//! `connection` module against the shared [`SearchEngine`].
//!
//! ## Concurrency Ceiling
//!
//! Sessions are bounded by a semaphore ([`ServerConfig::max_connections`],
//! default 1024). The accept loop takes a permit before accepting, so at
//! the ceiling new clients wait in the kernel backlog instead of spawning
//! unbounded tasks. The permit travels into the session task and is
//! released when the session ends.
//!
//! ## Failure Isolation
//!
//! Everything that can fail per connection (TLS handshake, session I/O,
//! lookups) happens inside the spawned task and is logged there. The
//! accept loop only ever logs accept errors and keeps going.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

use crate::connection::{handle_connection, ConnectionStats};
use crate::search::SearchEngine;

/// Default ceiling on concurrently served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Errors raised while setting up or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// The bound socket's address could not be read
    #[error("failed to read local address: {0}")]
    LocalAddr(std::io::Error),
}

/// Runtime server configuration (network side).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface address to bind to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Maximum number of concurrently served connections
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The listening server: accept loop plus per-connection task spawn.
///
/// Owns the engine and shares it read-only with every session. Dropping
/// the server stops accepting; in-flight sessions run to completion on
/// their own tasks.
pub struct LookupServer {
    listener: TcpListener,
    engine: Arc<SearchEngine>,
    tls: Option<TlsAcceptor>,
    stats: Arc<ConnectionStats>,
    limit: Arc<Semaphore>,
}

impl LookupServer {
    /// Binds the listening socket.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Network bind configuration
    /// * `engine` - The shared search engine (snapshot already built)
    /// * `tls` - Optional TLS acceptor; when present every accepted
    ///   connection is handshaken inside its own task before serving
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound. This
    /// is fatal at startup by design.
    pub async fn bind(
        cfg: &ServerConfig,
        engine: Arc<SearchEngine>,
        tls: Option<TlsAcceptor>,
    ) -> Result<Self, ServerError> {
        let addr = cfg.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            engine,
            tls,
            stats: Arc::new(ConnectionStats::new()),
            limit: Arc::new(Semaphore::new(cfg.max_connections)),
        })
    }

    /// The actual bound address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Shared connection statistics for this server.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the accept loop until the future is dropped.
    ///
    /// Each accepted connection gets its own task; a stalled client or a
    /// failed TLS handshake affects only that task.
    pub async fn run(self) {
        info!(
            algo = %self.engine.algorithm(),
            reread_on_query = self.engine.reread_on_query(),
            tls = self.tls.is_some(),
            "Accepting connections"
        );

        loop {
            let Ok(permit) = Arc::clone(&self.limit).acquire_owned().await else {
                // The semaphore is never closed while the server runs.
                break;
            };

            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let engine = Arc::clone(&self.engine);
                    let stats = Arc::clone(&self.stats);
                    let tls = self.tls.clone();

                    tokio::spawn(async move {
                        let _permit = permit;
                        match tls {
                            Some(acceptor) => match acceptor.accept(stream).await {
                                Ok(tls_stream) => {
                                    handle_connection(tls_stream, addr, engine, stats).await
                                }
                                Err(e) => {
                                    warn!(client = %addr, error = %e, "TLS handshake failed");
                                }
                            },
                            None => handle_connection(stream, addr, engine, stats).await,
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
