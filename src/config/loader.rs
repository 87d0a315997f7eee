//! Configuration Loading and Validation
//!
//! Parses the `key=value` configuration file into an immutable [`AppConfig`].
//!
//! ## Validation Rules
//!
//! - `linuxpath` is required, must be non-empty, and must point to a
//!   readable file.
//! - `search_algo` must name a supported algorithm, and that algorithm must
//!   be valid for the selected `reread_on_query` mode:
//!   - reread mode: `linear_scan`, `mmap_scan`, `grep_fx`
//!   - cached mode: `linear_scan`, `set_cache`, `sorted_bisect`
//! - `ssl_enabled=true` requires both `ssl_certfile` and `ssl_keyfile`.
//! - `ssl_enabled=true` with `ssl_verify=true` requires `ssl_cafile`.
//!
//! The loader checks file existence only; it never loads the dataset itself.
//! All failures abort startup before any socket is opened.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors produced while loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file itself could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `linuxpath=` was never given
    #[error("missing required config entry: linuxpath=")]
    MissingDataPath,

    /// `linuxpath=` was given with an empty value
    #[error("linuxpath is present but empty")]
    EmptyDataPath,

    /// The dataset file does not exist or cannot be opened for reading
    #[error("data file missing or unreadable: {}", .path.display())]
    DataFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A boolean key had an unrecognized value
    #[error("invalid boolean value for {key}: {value:?}")]
    InvalidBool { key: &'static str, value: String },

    /// `search_algo=` was given with an empty value
    #[error("search_algo is present but empty")]
    EmptyAlgo,

    /// `search_algo=` named an unknown algorithm
    #[error(
        "unsupported search_algo={0:?}; \
         allowed: grep_fx, linear_scan, mmap_scan, set_cache, sorted_bisect"
    )]
    UnknownAlgo(String),

    /// The algorithm is not valid for the selected consistency mode
    #[error("search_algo={algo} is not compatible with reread_on_query={reread_on_query}")]
    IncompatibleAlgo {
        algo: SearchAlgo,
        reread_on_query: bool,
    },

    /// TLS was enabled without certificate material
    #[error("ssl_enabled=true requires ssl_certfile=... and ssl_keyfile=...")]
    MissingTlsMaterial,

    /// Certificate verification was enabled without a trust anchor
    #[error("ssl_verify=true requires ssl_cafile=... (for self-signed cert verification)")]
    MissingTrustAnchor,
}

/// The five supported search strategies.
///
/// Resolved once at config load; the engine binds exactly one of these at
/// construction and never re-dispatches per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchAlgo {
    /// Sequential scan, stops at the first exact line match. Valid in both
    /// modes: reread scans the file, cached scans the snapshot.
    LinearScan,
    /// Memory-mapped scan over newline-delimited regions (reread only).
    MmapScan,
    /// External `grep -F -x` invocation per query (reread only).
    GrepFx,
    /// Hash-set membership over a one-time snapshot (cached only).
    SetCache,
    /// Binary search over a one-time sorted snapshot (cached only).
    SortedBisect,
}

impl SearchAlgo {
    /// All supported algorithms, in wire-name order.
    pub const ALL: [SearchAlgo; 5] = [
        SearchAlgo::LinearScan,
        SearchAlgo::MmapScan,
        SearchAlgo::GrepFx,
        SearchAlgo::SetCache,
        SearchAlgo::SortedBisect,
    ];

    /// The identifier used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            SearchAlgo::LinearScan => "linear_scan",
            SearchAlgo::MmapScan => "mmap_scan",
            SearchAlgo::GrepFx => "grep_fx",
            SearchAlgo::SetCache => "set_cache",
            SearchAlgo::SortedBisect => "sorted_bisect",
        }
    }

    /// Whether this algorithm may be used with the given consistency mode.
    ///
    /// Per-query reread excludes the snapshot-backed algorithms, and cached
    /// mode excludes the algorithms that only make sense against the live
    /// file. Linear scan works either way.
    pub fn valid_for(self, reread_on_query: bool) -> bool {
        match self {
            SearchAlgo::LinearScan => true,
            SearchAlgo::MmapScan | SearchAlgo::GrepFx => reread_on_query,
            SearchAlgo::SetCache | SearchAlgo::SortedBisect => !reread_on_query,
        }
    }
}

impl fmt::Display for SearchAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchAlgo {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear_scan" => Ok(SearchAlgo::LinearScan),
            "mmap_scan" => Ok(SearchAlgo::MmapScan),
            "grep_fx" => Ok(SearchAlgo::GrepFx),
            "set_cache" => Ok(SearchAlgo::SetCache),
            "sorted_bisect" => Ok(SearchAlgo::SortedBisect),
            other => Err(ConfigError::UnknownAlgo(other.to_string())),
        }
    }
}

/// Parsed application configuration.
///
/// Immutable once validated. The server builds its search engine and TLS
/// transport from this; the client reads the `ssl_*` fields to decide how to
/// wrap its connection.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the data file containing the rows to search
    pub linuxpath: PathBuf,
    /// If true, re-read the file on each query instead of serving a snapshot
    pub reread_on_query: bool,
    /// Selected search strategy
    pub search_algo: SearchAlgo,

    /// If true, enable TLS for server/client connections
    pub ssl_enabled: bool,
    /// Server certificate path (required when ssl_enabled=true)
    pub ssl_certfile: Option<PathBuf>,
    /// Server private key path (required when ssl_enabled=true)
    pub ssl_keyfile: Option<PathBuf>,

    /// If true, the client verifies the server certificate
    pub ssl_verify: bool,
    /// Trust anchor path for self-signed certificates. Required when
    /// ssl_enabled=true and ssl_verify=true.
    pub ssl_cafile: Option<PathBuf>,
}

/// Parses a boolean config value.
///
/// Accepted truthy tokens: true, 1, yes, y, on.
/// Accepted falsy tokens: false, 0, no, n, off.
/// Matching is case-insensitive.
fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

/// Turns a config value into an optional path: empty values mean "unset".
fn parse_opt_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Loads and validates the application configuration from a file.
///
/// # Arguments
///
/// * `config_path` - Path to the `key=value` configuration file
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, required keys are
/// missing, or any value fails validation.
pub fn load_config(config_path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = config_path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&raw)
}

/// Parses configuration text that has already been read into memory.
///
/// Split out from [`load_config`] so tests and embedders can validate
/// configuration without touching the filesystem for the config file itself
/// (the dataset readability check still hits the filesystem).
pub fn parse_config_str(raw: &str) -> Result<AppConfig, ConfigError> {
    let mut linuxpath: Option<PathBuf> = None;
    let mut reread_on_query = true;
    let mut search_algo_raw: Option<String> = None;

    let mut ssl_enabled = false;
    let mut ssl_certfile: Option<PathBuf> = None;
    let mut ssl_keyfile: Option<PathBuf> = None;
    let mut ssl_verify = true;
    let mut ssl_cafile: Option<PathBuf> = None;

    for line in raw.lines() {
        let stripped = line.trim();

        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let Some((key, value)) = stripped.split_once('=') else {
            // Not a key=value line; ignored like unknown keys.
            continue;
        };

        match key.trim() {
            "linuxpath" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ConfigError::EmptyDataPath);
                }
                linuxpath = Some(PathBuf::from(value));
            }
            "reread_on_query" => {
                reread_on_query = parse_bool("reread_on_query", value)?;
            }
            "search_algo" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ConfigError::EmptyAlgo);
                }
                search_algo_raw = Some(value.to_string());
            }
            "ssl_enabled" => {
                ssl_enabled = parse_bool("ssl_enabled", value)?;
            }
            "ssl_certfile" => {
                ssl_certfile = parse_opt_path(value);
            }
            "ssl_keyfile" => {
                ssl_keyfile = parse_opt_path(value);
            }
            "ssl_verify" => {
                ssl_verify = parse_bool("ssl_verify", value)?;
            }
            "ssl_cafile" => {
                ssl_cafile = parse_opt_path(value);
            }
            // Unknown keys are ignored.
            _ => {}
        }
    }

    let linuxpath = linuxpath.ok_or(ConfigError::MissingDataPath)?;

    // The dataset must be openable now; it is not loaded here.
    match fs::File::open(&linuxpath) {
        Ok(_) => {}
        Err(source) => {
            return Err(ConfigError::DataFileUnreadable {
                path: linuxpath,
                source,
            })
        }
    }

    let search_algo = match search_algo_raw {
        Some(raw) => raw.parse::<SearchAlgo>()?,
        None => SearchAlgo::LinearScan,
    };

    if !search_algo.valid_for(reread_on_query) {
        return Err(ConfigError::IncompatibleAlgo {
            algo: search_algo,
            reread_on_query,
        });
    }

    if ssl_enabled && (ssl_certfile.is_none() || ssl_keyfile.is_none()) {
        return Err(ConfigError::MissingTlsMaterial);
    }

    if ssl_enabled && ssl_verify && ssl_cafile.is_none() {
        return Err(ConfigError::MissingTrustAnchor);
    }

    Ok(AppConfig {
        linuxpath,
        reread_on_query,
        search_algo,
        ssl_enabled,
        ssl_certfile,
        ssl_keyfile,
        ssl_verify,
        ssl_cafile,
    })
}
