//! Connection Handling Module
//!
//! This module manages individual client connections. Each accepted
//! connection is served by its own async task running a persistent
//! query/response session against the shared search engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  TCP/TLS Listener                           │
//! │                  (server module)                            │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() + spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read line   │───>│ Engine      │───>│ Write DEBUG │      │
//! │  │ from socket │    │ contains()  │    │ + result    │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │         ▲                                     │             │
//! │         └─────────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session Policy
//!
//! - Queries are answered exactly once, in arrival order.
//! - Bounded malformed input (including over-length lines) is a normal
//!   query outcome, not a connection error.
//! - Only transport-level failures (EOF, socket errors, a line that never
//!   terminates within the buffer cap) end the session.
//! - A lookup failure inside one session never escapes its task.

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
