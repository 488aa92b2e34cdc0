//! Server configuration.
//!
//! A [`ServerConfig`] is built once at startup and shared behind an `Arc`
//! by the dispatcher and the server loop. Nothing mutates it afterwards.

use crate::error::{io_is_not_exists, DavServeError, DavServeResult};
use std::fmt;
use std::fs::Metadata;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use subtle::ConstantTimeEq;

/// Listen address used when none is given (all interfaces, port 80).
pub const DEFAULT_LISTEN: &str = ":80";

/// Certificate file used in TLS mode when none is given.
pub const DEFAULT_CERT_FILE: &str = "cert.pem";

/// Private key file used in TLS mode when none is given.
pub const DEFAULT_KEY_FILE: &str = "key.pem";

/// Static username/password pair for HTTP Basic authentication.
///
/// Authentication is only active when *both* values are non-empty. A lone
/// username or a lone password leaves the server open.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair. Empty strings mean "not set".
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns true if requests must carry matching credentials.
    pub fn is_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Returns true if exactly one of the pair is set, which leaves
    /// authentication off.
    pub fn is_partial(&self) -> bool {
        self.username.is_empty() != self.password.is_empty()
    }

    /// The configured username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compares a supplied pair against the configured one in constant time.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// TLS mode and the PEM files it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Serve HTTPS instead of HTTP.
    pub enabled: bool,
    /// PEM certificate chain.
    pub cert_file: PathBuf,
    /// PEM private key.
    pub key_file: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: PathBuf::from(DEFAULT_CERT_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
        }
    }
}

/// Configuration for the WebDAV server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory exposed at `/`.
    pub root: PathBuf,
    /// Listen address: `host:port`, `:port` or `[v6]:port`.
    pub listen: String,
    /// TLS settings.
    pub tls: TlsConfig,
    /// Basic auth credentials.
    pub credentials: Credentials,
    /// Reject content-mutating methods with 403.
    pub read_only: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            listen: DEFAULT_LISTEN.to_string(),
            tls: TlsConfig::default(),
            credentials: Credentials::default(),
            read_only: false,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration serving `root` with all other settings at
    /// their defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Sets the listen address.
    #[must_use]
    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = listen.into();
        self
    }

    /// Enables TLS with the given certificate and key files.
    #[must_use]
    pub fn with_tls(mut self, cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.tls = TlsConfig {
            enabled: true,
            cert_file: cert_file.into(),
            key_file: key_file.into(),
        };
        self
    }

    /// Sets the Basic auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    /// Turns read-only mode on or off.
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Resolves [`Self::listen`] to a socket address.
    pub fn listen_addr(&self) -> DavServeResult<SocketAddr> {
        parse_listen_addr(&self.listen)
    }

    /// Like [`Self::listen_addr`], but resolves host names without blocking
    /// the runtime.
    pub async fn resolve_listen_addr(&self) -> DavServeResult<SocketAddr> {
        resolve_listen_addr(&self.listen).await
    }

    /// Checks that the root exists and is a directory.
    pub fn validate(&self) -> DavServeResult<()> {
        check_root(&self.root, std::fs::metadata(&self.root))
    }

    /// Like [`Self::validate`], but stats the root on the blocking pool.
    pub async fn validate_async(&self) -> DavServeResult<()> {
        check_root(&self.root, tokio::fs::metadata(&self.root).await)
    }
}

/// Parses a listen address.
///
/// Accepts anything `SocketAddr` parses, the `:port` shorthand for all IPv4
/// interfaces, and `host:port` pairs that resolve.
pub fn parse_listen_addr(addr: &str) -> DavServeResult<SocketAddr> {
    let addr = addr.trim();
    if let Some(literal) = parse_literal(addr) {
        return literal;
    }

    addr.to_socket_addrs()
        .map_err(|e| DavServeError::InvalidAddress(format!("{addr}: {e}")))?
        .next()
        .ok_or_else(|| DavServeError::InvalidAddress(addr.to_string()))
}

/// Async form of [`parse_listen_addr`] using `tokio::net::lookup_host`.
pub async fn resolve_listen_addr(addr: &str) -> DavServeResult<SocketAddr> {
    let addr = addr.trim();
    if let Some(literal) = parse_literal(addr) {
        return literal;
    }

    tokio::net::lookup_host(addr)
        .await
        .map_err(|e| DavServeError::InvalidAddress(format!("{addr}: {e}")))?
        .next()
        .ok_or_else(|| DavServeError::InvalidAddress(addr.to_string()))
}

/// Forms that need no name resolution. `None` means "try DNS".
fn parse_literal(addr: &str) -> Option<DavServeResult<SocketAddr>> {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Some(Ok(sock));
    }

    let port = addr.strip_prefix(':')?;
    Some(
        port.parse::<u16>()
            .map(|port| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
            .map_err(|_| DavServeError::InvalidAddress(addr.to_string())),
    )
}

fn check_root(root: &Path, meta: io::Result<Metadata>) -> DavServeResult<()> {
    match meta {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DavServeError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) if io_is_not_exists(&e) => Err(DavServeError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "does not exist".to_string(),
        }),
        Err(e) => Err(DavServeError::Io(e)),
    }
}
