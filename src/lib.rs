//! # linefind - A TCP Exact Full-Line Lookup Server
//!
//! linefind is a newline-delimited TCP (optionally TLS) server written in Rust.
//! Clients send query strings over a persistent connection and receive one
//! result line per query: `STRING EXISTS` or `STRING NOT FOUND`.
//! A query matches only when it equals a complete line of the data file.
//!
//! ## Features
//!
//! - **Five search algorithms**: linear scan, memory-mapped scan, external
//!   grep, hash-set cache, and sorted binary search
//! - **Two consistency modes**: re-read the file on every query, or serve
//!   from an immutable snapshot taken at startup
//! - **Optional TLS**: rustls-based transport encryption with configurable
//!   certificate verification
//! - **Async I/O**: Built on Tokio for handling thousands of concurrent
//!   connections
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              linefind                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP/TLS     │───>│ Connection  │───>│  Search     │                  │
//! │  │ Listener    │    │  Handler    │    │  Engine     │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐    │
//! │  │   Config    │    │             Search Backend                   │    │
//! │  │   Loader    │    │  ┌──────────┐ ┌──────────┐ ┌─────────────┐   │    │
//! │  │             │    │  │ file     │ │ mmap /   │ │ immutable   │   │    │
//! │  └─────────────┘    │  │ scan     │ │ grep     │ │ snapshot    │   │    │
//! │                     │  └──────────┘ └──────────┘ └─────────────┘   │    │
//! │                     └──────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use linefind::config::load_config;
//! use linefind::search::SearchEngine;
//! use linefind::server::{LookupServer, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app_cfg = load_config("app.conf")?;
//!     let engine = Arc::new(SearchEngine::from_config(&app_cfg)?);
//!
//!     let cfg = ServerConfig::default();
//!     let server = LookupServer::bind(&cfg, engine, None).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Protocol
//!
//! One UTF-8 line per query, `\n`-terminated. Per query the server replies
//! with a `DEBUG:` diagnostic line (client IP, query, elapsed milliseconds)
//! followed by the result line. The connection stays open for further
//! queries until the client disconnects.
//!
//! ```text
//! C: abc\n
//! S: DEBUG: ip=127.0.0.1 query="abc" elapsed_ms=0.412\n
//! S: STRING EXISTS\n
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: key=value configuration parsing and validation
//! - [`search`]: search algorithms and the engine that dispatches them
//! - [`protocol`]: response lines and the DEBUG diagnostic format
//! - [`connection`]: per-client session loop
//! - [`server`]: listener, accept loop, and TLS wiring
//!
//! ## Design Highlights
//!
//! ### Consistency Modes
//!
//! With `reread_on_query=true` every lookup re-reads the data file, so edits
//! are visible immediately at the cost of an I/O pass per query. With
//! `reread_on_query=false` the engine loads one immutable snapshot at
//! construction; later file edits stay invisible until restart. That
//! staleness is the documented contract of cached mode, not a defect.
//!
//! ### Lock-Free Sharing
//!
//! The snapshot never mutates after construction, so every connection task
//! holds a plain `Arc<SearchEngine>` and concurrent lookups need no locking.
//!
//! ### One Task Per Connection
//!
//! A slow or stalled client only ever blocks its own task. TLS handshakes
//! run inside the per-connection task so they cannot stall the accept loop.

pub mod config;
pub mod connection;
pub mod protocol;
pub mod search;
pub mod server;

// Re-export commonly used types for convenience
pub use config::{load_config, AppConfig, ConfigError, SearchAlgo};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::Response;
pub use search::{EngineError, SearchEngine};
pub use server::{LookupServer, ServerConfig};

/// The default port linefind listens on
pub const DEFAULT_PORT: u16 = 44445;

/// The default host linefind binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of linefind
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
