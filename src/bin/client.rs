//! linefind-client - One-Shot Lookup Client
//!
//! Connects to a linefind server, sends a single newline-terminated query,
//! then reads and prints the server response (DEBUG line + result line).
//!
//! TLS is optional. When a config file is provided via --config, its
//! `ssl_*` settings decide whether to wrap the connection in TLS and
//! whether to verify the server certificate against the configured trust
//! anchor.

use linefind::config::load_config;
use linefind::protocol::{RESPONSE_EXISTS, RESPONSE_NOT_FOUND};
use linefind::server::{build_client_tls, server_name};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Bytes to request per read call
const RECV_BUFSIZE: usize = 4096;

/// Overall deadline so a stalled server cannot hang the client forever
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Safety cap on the response size
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Command-line arguments for the client
struct Args {
    host: String,
    port: u16,
    config: Option<PathBuf>,
    query: String,
}

impl Args {
    fn from_args() -> Self {
        let mut host = linefind::DEFAULT_HOST.to_string();
        let mut port = linefind::DEFAULT_PORT;
        let mut config: Option<PathBuf> = None;
        let mut query: Option<String> = None;

        let args: Vec<String> = std::env::args().collect();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" => {
                    if i + 1 < args.len() {
                        host = args[i + 1].clone();
                        i += 2;
                    } else {
                        die("Error: --host requires a value");
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        port = args[i + 1].parse().unwrap_or_else(|_| {
                            die("Error: invalid port number");
                        });
                        i += 2;
                    } else {
                        die("Error: --port requires a value");
                    }
                }
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        config = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    } else {
                        die("Error: --config requires a value");
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    if other.starts_with('-') {
                        die(&format!("Unknown argument: {other}"));
                    }
                    if query.is_some() {
                        die("Error: exactly one query argument is expected");
                    }
                    query = Some(other.to_string());
                    i += 1;
                }
            }
        }

        let Some(query) = query else {
            print_help();
            die("Error: a query argument is required");
        };

        Self {
            host,
            port,
            config,
            query,
        }
    }
}

fn print_help() {
    println!(
        r#"
linefind-client - One-Shot Lookup Client

USAGE:
    linefind-client [OPTIONS] <QUERY>

OPTIONS:
        --host <HOST>      Server host (default: 127.0.0.1)
    -p, --port <PORT>      Server port (default: 44445)
    -c, --config <FILE>    Optional config file (used for SSL settings)
        --help             Print this help message

EXAMPLES:
    linefind-client "some exact line"
    linefind-client --config app.conf --port 9000 "some exact line"
"#
    );
}

/// Prints an error message and exits with a non-zero status.
fn die(msg: &str) -> ! {
    eprintln!("{msg}");
    std::process::exit(2);
}

/// Returns true if `haystack` contains `needle` as a subslice.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Sends the query and reads until a result line is observed.
///
/// The server keeps the connection open after responding, so EOF may never
/// arrive; reading stops at the first protocol terminator instead.
async fn exchange<S>(stream: &mut S, query: &str) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(format!("{query}\n").as_bytes()).await?;
    stream.flush().await?;

    let mut response = Vec::new();
    let mut chunk = vec![0u8; RECV_BUFSIZE];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(response);
        }
        response.extend_from_slice(&chunk[..n]);

        if contains_bytes(&response, RESPONSE_EXISTS)
            || contains_bytes(&response, RESPONSE_NOT_FOUND)
        {
            return Ok(response);
        }
        if response.len() > MAX_RESPONSE_BYTES {
            return Ok(response);
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::from_args();

    // The connector is built before connecting so config errors surface
    // without touching the network.
    let connector = match &args.config {
        Some(path) => {
            let cfg = match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => die(&format!("Config error: {e}")),
            };
            match build_client_tls(&cfg) {
                Ok(connector) => connector,
                Err(e) => die(&format!("TLS error: {e}")),
            }
        }
        None => None,
    };

    let addr = format!("{}:{}", args.host, args.port);
    let stream = match timeout(RECV_TIMEOUT, TcpStream::connect(addr.as_str())).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => die(&format!("Network error connecting to {addr}: {e}")),
        Err(_) => die(&format!("Timeout connecting to {addr}")),
    };

    let response = match connector {
        Some(connector) => {
            let name = match server_name(&args.host) {
                Ok(name) => name,
                Err(e) => die(&format!("TLS error: {e}")),
            };
            let mut tls_stream = match connector.connect(name, stream).await {
                Ok(tls_stream) => tls_stream,
                Err(e) => die(&format!(
                    "SSL/TLS handshake failed.\n\
                     Reason: {e}\n\n\
                     If using a self-signed certificate, ensure the config includes:\n\
                     \x20 ssl_enabled=True\n\
                     \x20 ssl_verify=True\n\
                     \x20 ssl_cafile=certs/server.crt\n\n\
                     For local-only encryption without verification, set:\n\
                     \x20 ssl_verify=False"
                )),
            };
            run_query(&mut tls_stream, &args.query).await
        }
        None => {
            let mut stream = stream;
            run_query(&mut stream, &args.query).await
        }
    };

    print!("{}", String::from_utf8_lossy(&response));
}

/// Runs the exchange under the receive deadline and maps failures to
/// actionable messages.
async fn run_query<S>(stream: &mut S, query: &str) -> Vec<u8>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match timeout(RECV_TIMEOUT, exchange(stream, query)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => die(
            "Connection reset by server.\n\
             This often means the server has SSL/TLS enabled but the client\n\
             was run without --config. Try:\n\
             \x20 linefind-client --config app.conf <QUERY>",
        ),
        Ok(Err(e)) => die(&format!("Network error: {e}")),
        Err(_) => die(
            "Timeout: no complete response received.\n\
             Check server reachability and whether SSL settings match.",
        ),
    }
}
