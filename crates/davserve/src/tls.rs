//! TLS acceptor built from PEM files.

use crate::error::{DavServeError, DavServeResult};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

/// Loads a certificate chain and private key and builds an acceptor that
/// offers HTTP/2 and HTTP/1.1 via ALPN.
pub fn load_acceptor(cert_file: &Path, key_file: &Path) -> DavServeResult<TlsAcceptor> {
    let certs = load_certs(cert_file)?;
    let key = load_key(key_file)?;
    debug!(
        cert_file = %cert_file.display(),
        key_file = %key_file.display(),
        chain_len = certs.len(),
        "Loaded TLS material"
    );

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DavServeError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| DavServeError::Tls(format!("invalid certificate or key: {e}")))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> DavServeResult<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| tls_error(path, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error(path, e))?;
    if certs.is_empty() {
        return Err(DavServeError::Tls(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> DavServeResult<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_file(path).map_err(|e| tls_error(path, e))
}

fn tls_error(path: &Path, err: impl std::fmt::Display) -> DavServeError {
    DavServeError::Tls(format!("{}: {err}", path.display()))
}
