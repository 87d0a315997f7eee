//! Wire Protocol Types
//!
//! The lookup protocol is line-oriented and deliberately small:
//!
//! ```text
//! C: <query>\n
//! S: DEBUG: ip=<client-ip> query="<query>" elapsed_ms=<t>\n
//! S: STRING EXISTS\n        (or STRING NOT FOUND\n)
//! ```
//!
//! Queries are UTF-8 text terminated by `\n`; trailing `\r` and NUL bytes
//! are stripped so `nc`-style clients and CRLF senders both work. Every
//! query receives exactly one result line, in arrival order, over a
//! connection that stays open until the client disconnects.

use std::fmt;
use std::net::IpAddr;

/// Result line for a hit
pub const RESPONSE_EXISTS: &[u8] = b"STRING EXISTS\n";

/// Result line for a miss
pub const RESPONSE_NOT_FOUND: &[u8] = b"STRING NOT FOUND\n";

/// Maximum accepted query length in bytes (excluding the terminator).
///
/// Longer lines are answered with a diagnostic plus `STRING NOT FOUND`
/// instead of tearing the connection down.
pub const MAX_QUERY_BYTES: usize = 1024;

/// Outcome of one lookup, as written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The query matched a full line of the dataset
    Exists,
    /// No line of the dataset equals the query
    NotFound,
}

impl Response {
    /// Maps an engine hit/miss to the wire response.
    pub fn from_hit(hit: bool) -> Self {
        if hit {
            Response::Exists
        } else {
            Response::NotFound
        }
    }

    /// The newline-terminated wire form of this response.
    pub fn as_line(self) -> &'static [u8] {
        match self {
            Response::Exists => RESPONSE_EXISTS,
            Response::NotFound => RESPONSE_NOT_FOUND,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Exists => f.write_str("STRING EXISTS"),
            Response::NotFound => f.write_str("STRING NOT FOUND"),
        }
    }
}

/// Formats the per-query diagnostic line.
///
/// The query is debug-quoted so control characters cannot corrupt the
/// line-oriented framing.
pub fn debug_line(ip: IpAddr, query: &str, elapsed_ms: f64) -> String {
    format!("DEBUG: ip={ip} query={query:?} elapsed_ms={elapsed_ms:.3}\n")
}

/// Formats the diagnostic line for a query rejected before lookup.
pub fn debug_error_line(reason: &str) -> String {
    format!("DEBUG: error={reason}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_response_wire_lines() {
        assert_eq!(Response::Exists.as_line(), b"STRING EXISTS\n");
        assert_eq!(Response::NotFound.as_line(), b"STRING NOT FOUND\n");
    }

    #[test]
    fn test_response_from_hit() {
        assert_eq!(Response::from_hit(true), Response::Exists);
        assert_eq!(Response::from_hit(false), Response::NotFound);
    }

    #[test]
    fn test_debug_line_format() {
        let line = debug_line(IpAddr::V4(Ipv4Addr::LOCALHOST), "abc", 0.4119);
        assert_eq!(line, "DEBUG: ip=127.0.0.1 query=\"abc\" elapsed_ms=0.412\n");
    }

    #[test]
    fn test_debug_line_escapes_control_characters() {
        let line = debug_line(IpAddr::V4(Ipv4Addr::LOCALHOST), "a\tb", 1.0);
        assert!(line.starts_with("DEBUG: ip=127.0.0.1 query=\"a\\tb\""));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_debug_error_line() {
        assert_eq!(
            debug_error_line("query too long"),
            "DEBUG: error=query too long\n"
        );
    }
}
