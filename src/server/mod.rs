//! Server Module
//!
//! This module owns the listening side of linefind: binding the TCP
//! listener, optional TLS wrapping, the accept loop, and the per-connection
//! task spawn.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      LookupServer                           │
//! │                                                             │
//! │   bind(host:port) ──> accept loop ──┬──> task: session 1    │
//! │        │                            ├──> task: session 2    │
//! │   TlsAcceptor (optional)            └──> task: session N    │
//! │        │                                      ▲             │
//! │        └── handshake runs inside each task ───┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A semaphore bounds the number of concurrently served sessions; when the
//! ceiling is reached the accept loop waits for a session to finish before
//! accepting again. TLS handshakes run inside the per-connection task, so a
//! slow or failing handshake never stalls accepting, and a handshake
//! failure closes only that one connection.

pub mod listener;
pub mod tls;

// Re-export commonly used types
pub use listener::{LookupServer, ServerConfig, ServerError};
pub use tls::{build_client_tls, build_server_tls, server_name, TlsError};
