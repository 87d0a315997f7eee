//! Connection Handler
//!
//! Serves one client connection: read a newline-terminated query, look it
//! up in the shared engine, write the diagnostic and result lines, repeat.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake, then TLS handshake if enabled)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  read bytes ─> split lines   │
//!    │       │                      │
//!    │       ▼                      │
//!    │  engine.contains(query)      │
//!    │       │                      │
//!    │       ▼                      │
//!    │  write DEBUG + result line   │
//!    │       │                      │
//!    │       ▼                      │
//!    │   [loop back]                │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / transport error
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol: a read may deliver a partial query or several
//! queries at once. Incoming bytes accumulate in a `BytesMut` buffer and
//! complete lines are split off one at a time, so responses always come
//! back in arrival order. The buffer is capped; a client that streams
//! endless bytes without a newline is disconnected.

use crate::protocol::{self, Response, MAX_QUERY_BYTES};
use crate::search::SearchEngine;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Maximum size for the read buffer (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total queries answered
    pub queries_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn query_processed(&self) {
        self.queries_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected normally
    #[error("client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial query never terminated)
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded without a line terminator
    #[error("buffer size limit exceeded")]
    BufferFull,
}

/// Handles a single client connection.
///
/// Generic over the stream type so plain `TcpStream` and TLS-wrapped
/// streams share one session implementation. The handler owns the socket
/// and a shared reference to the engine; it is dropped when the connection
/// closes.
pub struct ConnectionHandler<S> {
    /// The stream for this connection (plain TCP or TLS)
    stream: BufWriter<S>,

    /// Client's address (for logging and the DEBUG line)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The search engine (shared read-only across connections)
    engine: Arc<SearchEngine>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The connected stream (plain or TLS)
    /// * `addr` - The client's socket address
    /// * `engine` - The shared search engine
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        engine: Arc<SearchEngine>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            engine,
            stats,
        }
    }

    /// Runs the session until the client disconnects or the transport fails.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-lookup-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_line() {
                self.answer(&line).await?;
            }

            // Need more data - read from the socket
            self.read_more_data().await?;
        }
    }

    /// Splits the next complete line off the buffer, if one has arrived.
    ///
    /// The returned line has its `\n` terminator plus any trailing `\r` and
    /// NUL bytes removed.
    fn next_line(&mut self) -> Option<BytesMut> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line = self.buffer.split_to(pos + 1);
        line.truncate(pos);

        while line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        while line.last() == Some(&0) {
            line.truncate(line.len() - 1);
        }

        trace!(
            client = %self.addr,
            len = line.len(),
            remaining = self.buffer.len(),
            "Extracted query line"
        );
        Some(line)
    }

    /// Answers one query: DEBUG line first, then the result line.
    ///
    /// Over-length queries and engine failures are per-query outcomes; the
    /// session stays open either way.
    async fn answer(&mut self, raw: &[u8]) -> Result<(), ConnectionError> {
        if raw.len() > MAX_QUERY_BYTES {
            warn!(client = %self.addr, len = raw.len(), "Query exceeds size limit");
            self.write_all(protocol::debug_error_line("query too long").as_bytes())
                .await?;
            self.write_all(Response::NotFound.as_line()).await?;
            self.stream.flush().await?;
            self.stats.query_processed();
            return Ok(());
        }

        let query = String::from_utf8_lossy(raw);

        let start = Instant::now();
        let hit = match self.engine.contains(&query).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Lookup failed, answering NOT FOUND");
                false
            }
        };
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = Response::from_hit(hit);
        trace!(
            client = %self.addr,
            query = %query,
            response = %response,
            elapsed_ms = elapsed_ms,
            "Query answered"
        );

        self.write_all(protocol::debug_line(self.addr.ip(), &query, elapsed_ms).as_bytes())
            .await?;
        self.write_all(response.as_line()).await?;
        self.stream.flush().await?;
        self.stats.query_processed();

        Ok(())
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        // A line that never terminates within the cap is transport-fatal.
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            warn!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial query in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Writes bytes to the (buffered) stream and counts them.
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(bytes).await?;
        self.stats.bytes_written(bytes.len());
        Ok(())
    }
}

/// Handles a client connection to completion.
///
/// This is a convenience function that creates a [`ConnectionHandler`] and
/// runs it, downgrading expected disconnect errors to debug logs so a
/// failing session can never take anything else down with it.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    engine: Arc<SearchEngine>,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, engine, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
