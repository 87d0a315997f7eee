//! Configuration Module
//!
//! This module parses and validates the `key=value` configuration file that
//! drives the server and client.
//!
//! ## File Format
//!
//! ```text
//! # comment lines start with '#'
//! linuxpath=/var/data/rows.txt
//! reread_on_query=True
//! search_algo=linear_scan
//!
//! ssl_enabled=False
//! ssl_certfile=certs/server.crt
//! ssl_keyfile=certs/server.key
//! ssl_verify=True
//! ssl_cafile=certs/server.crt
//! ```
//!
//! Blank lines and comments are skipped; unknown keys are ignored so configs
//! can be shared with other tools. Validation happens entirely at load time
//! and produces an immutable [`AppConfig`] or a [`ConfigError`]; a bad
//! config never gets as far as opening a socket.

pub mod loader;

// Re-export the configuration surface
pub use loader::{load_config, parse_config_str, AppConfig, ConfigError, SearchAlgo};
