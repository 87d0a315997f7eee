//! TLS Transport Wiring
//!
//! Builds the rustls configurations both binaries need from the `ssl_*`
//! config keys:
//!
//! - **Server side**: a [`TlsAcceptor`] presenting the configured
//!   certificate chain and private key.
//! - **Client side**: a [`TlsConnector`] that either verifies the server
//!   against the configured trust anchor (rustls performs the SAN-aware
//!   hostname/IP check) or, with `ssl_verify=false`, encrypts without
//!   identity verification.
//!
//! Certificate material is PEM, loaded with `rustls-pemfile`. All failures
//! here are startup-fatal; nothing in this module runs per connection.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    self, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::config::AppConfig;

/// Errors raised while assembling TLS configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// A certificate, key, or CA file could not be read
    #[error("failed to read TLS file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The PEM file contained no certificates
    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    /// The PEM file contained no private key
    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    /// TLS is enabled but cert/key paths are not configured
    #[error("ssl_enabled=true requires ssl_certfile=... and ssl_keyfile=...")]
    MissingMaterial,

    /// Verification is enabled but no trust anchor is configured
    #[error("ssl_verify=true requires ssl_cafile=...")]
    MissingTrustAnchor,

    /// The host string cannot be used as a TLS server name
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// Certificate material was rejected by rustls
    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Reads all certificates from a PEM file.
fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Reads the first private key from a PEM file.
fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

/// Builds the server-side TLS acceptor if TLS is enabled.
///
/// Returns `Ok(None)` when `ssl_enabled=false`.
///
/// # Errors
///
/// Returns [`TlsError`] if certificate material is missing, unreadable, or
/// rejected by rustls.
pub fn build_server_tls(cfg: &AppConfig) -> Result<Option<TlsAcceptor>, TlsError> {
    if !cfg.ssl_enabled {
        return Ok(None);
    }

    let (Some(certfile), Some(keyfile)) = (&cfg.ssl_certfile, &cfg.ssl_keyfile) else {
        return Err(TlsError::MissingMaterial);
    };

    let certs = load_certs(certfile)?;
    let key = load_private_key(keyfile)?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(Some(TlsAcceptor::from(Arc::new(config))))
}

/// Builds the client-side TLS connector if TLS is enabled.
///
/// Returns `Ok(None)` when `ssl_enabled=false`. With `ssl_verify=true` the
/// configured `ssl_cafile` becomes the root store, so self-signed server
/// certificates verify when the client trusts them explicitly. With
/// `ssl_verify=false` the connection is encrypted but the server identity
/// is not checked.
///
/// # Errors
///
/// Returns [`TlsError`] if the trust anchor is missing or unreadable.
pub fn build_client_tls(cfg: &AppConfig) -> Result<Option<TlsConnector>, TlsError> {
    if !cfg.ssl_enabled {
        return Ok(None);
    }

    let config = if cfg.ssl_verify {
        let Some(cafile) = &cfg.ssl_cafile else {
            return Err(TlsError::MissingTrustAnchor);
        };
        let mut roots = RootCertStore::empty();
        for cert in load_certs(cafile)? {
            roots.add(cert)?;
        }
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    } else {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerification))
            .with_no_client_auth()
    };

    Ok(Some(TlsConnector::from(Arc::new(config))))
}

/// Converts a host string into the server name used for SNI and, when
/// verification is on, the certificate hostname/IP check.
///
/// # Errors
///
/// Returns [`TlsError::InvalidServerName`] if the host is neither a valid
/// DNS name nor an IP address.
pub fn server_name(host: &str) -> Result<ServerName<'static>, TlsError> {
    ServerName::try_from(host.to_string())
        .map_err(|_| TlsError::InvalidServerName(host.to_string()))
}

/// Certificate verifier that accepts any server certificate.
///
/// Installed only when the operator sets `ssl_verify=false`: the session is
/// still encrypted, but the peer's identity is taken on faith.
#[derive(Debug)]
struct NoVerification;

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchAlgo;
    use std::fs;
    use tempfile::TempDir;

    fn base_config(ssl_enabled: bool) -> (TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, "alpha\n").unwrap();
        let cfg = AppConfig {
            linuxpath: data,
            reread_on_query: true,
            search_algo: SearchAlgo::LinearScan,
            ssl_enabled,
            ssl_certfile: None,
            ssl_keyfile: None,
            ssl_verify: true,
            ssl_cafile: None,
        };
        (dir, cfg)
    }

    #[test]
    fn test_tls_disabled_builds_nothing() {
        let (_dir, cfg) = base_config(false);
        assert!(build_server_tls(&cfg).unwrap().is_none());
        assert!(build_client_tls(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_server_tls_requires_material() {
        let (_dir, cfg) = base_config(true);
        assert!(matches!(
            build_server_tls(&cfg),
            Err(TlsError::MissingMaterial)
        ));
    }

    #[test]
    fn test_server_tls_missing_files_fail() {
        let (_dir, mut cfg) = base_config(true);
        cfg.ssl_certfile = Some(PathBuf::from("/no/such/server.crt"));
        cfg.ssl_keyfile = Some(PathBuf::from("/no/such/server.key"));
        assert!(matches!(build_server_tls(&cfg), Err(TlsError::Io { .. })));
    }

    #[test]
    fn test_client_tls_verify_requires_cafile() {
        let (_dir, mut cfg) = base_config(true);
        cfg.ssl_certfile = Some(PathBuf::from("certs/server.crt"));
        cfg.ssl_keyfile = Some(PathBuf::from("certs/server.key"));
        assert!(matches!(
            build_client_tls(&cfg),
            Err(TlsError::MissingTrustAnchor)
        ));
    }

    #[test]
    fn test_client_tls_without_verification_builds() {
        let (_dir, mut cfg) = base_config(true);
        cfg.ssl_certfile = Some(PathBuf::from("certs/server.crt"));
        cfg.ssl_keyfile = Some(PathBuf::from("certs/server.key"));
        cfg.ssl_verify = false;
        assert!(build_client_tls(&cfg).unwrap().is_some());
    }

    #[test]
    fn test_empty_pem_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pem = dir.path().join("empty.crt");
        fs::write(&pem, "").unwrap();
        assert!(matches!(
            load_certs(&pem),
            Err(TlsError::NoCertificates(_))
        ));
    }

    #[test]
    fn test_server_name_accepts_hostnames_and_ips() {
        server_name("localhost").unwrap();
        server_name("127.0.0.1").unwrap();
        server_name("example.com").unwrap();
        assert!(matches!(
            server_name("not a hostname"),
            Err(TlsError::InvalidServerName(_))
        ));
    }
}
