//! linefind - A TCP Exact Full-Line Lookup Server
//!
//! This is the main entry point for the linefind server.
//! It loads and validates the configuration, builds the search engine
//! (including the cache snapshot in cached mode), wires up optional TLS,
//! and runs the accept loop until Ctrl+C.

use linefind::config::load_config;
use linefind::connection::ConnectionStats;
use linefind::search::SearchEngine;
use linefind::server::{build_server_tls, LookupServer, ServerConfig};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the server
struct Args {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Path to the configuration file
    config: PathBuf,
}

impl Args {
    /// Parse arguments from the command line
    fn from_args() -> Self {
        let mut host = linefind::DEFAULT_HOST.to_string();
        let mut port = linefind::DEFAULT_PORT;
        let mut config: Option<PathBuf> = None;

        let args: Vec<String> = std::env::args().collect();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" => {
                    if i + 1 < args.len() {
                        host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        config = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    } else {
                        eprintln!("Error: --config requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("linefind version {}", linefind::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        let Some(config) = config else {
            eprintln!("Error: --config is required (must include linuxpath=...)");
            print_help();
            std::process::exit(1);
        };

        Self { host, port, config }
    }
}

fn print_help() {
    println!(
        r#"
linefind - A TCP Exact Full-Line Lookup Server

USAGE:
    linefind --config <FILE> [OPTIONS]

OPTIONS:
        --host <HOST>      Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>      Port to listen on (default: 44445)
    -c, --config <FILE>    Path to configuration file (required)
    -v, --version          Print version information
        --help             Print this help message

EXAMPLES:
    linefind --config app.conf                 # Start on 127.0.0.1:44445
    linefind --config app.conf --port 9000     # Start on port 9000
    linefind --config app.conf --host 0.0.0.0  # Listen on all interfaces

QUERYING:
    Any line-oriented TCP client works:
    $ echo "some exact line" | nc 127.0.0.1 44445
    DEBUG: ip=127.0.0.1 query="some exact line" elapsed_ms=0.312
    STRING EXISTS
"#
    );
}

fn print_banner(addr: &str, tls: bool, engine: &SearchEngine) {
    println!(
        r#"
linefind v{} - TCP Exact Full-Line Lookup Server
────────────────────────────────────────────────
Listening on      {}
TLS               {}
Search algorithm  {}
Reread on query   {}

Ready to accept connections. Use Ctrl+C to shutdown gracefully.
"#,
        linefind::VERSION,
        addr,
        if tls { "enabled" } else { "disabled" },
        engine.algorithm(),
        engine.reread_on_query(),
    );
}

/// Waits for all in-flight sessions to finish after accepting stops.
async fn drain_sessions(stats: &Arc<ConnectionStats>) {
    while stats.active_connections.load(Ordering::Relaxed) > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::from_args();

    // Set up logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // All validation happens before any socket is opened.
    let app_cfg = load_config(&args.config)?;

    // Cached-mode snapshots are built here, once, before serving.
    let engine = Arc::new(SearchEngine::from_config(&app_cfg)?);
    info!(
        algo = %engine.algorithm(),
        reread_on_query = engine.reread_on_query(),
        data_file = %app_cfg.linuxpath.display(),
        "Search engine initialized"
    );

    let tls = build_server_tls(&app_cfg)?;

    let cfg = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::default()
    };
    let server = LookupServer::bind(&cfg, engine.clone(), tls.clone()).await?;
    let stats = server.stats();
    info!("Listening on {}", cfg.bind_address());

    print_banner(&cfg.bind_address(), tls.is_some(), &engine);

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, no longer accepting connections");
    };

    // Accept until Ctrl+C, then let in-flight sessions finish.
    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    drain_sessions(&stats).await;
    info!("Server shutdown complete");
    Ok(())
}
