//! Error types and not-found classification.
//!
//! Startup failures (binding, TLS material, bad root) are reported through
//! [`DavServeError`]. Request handling never fails with a Rust error: every
//! path ends in an HTTP response.
//!
//! The second half of this module is the single place where "does not exist"
//! is decided. The filesystem adapter funnels every lookup result through
//! [`canonicalize`], so the protocol engine only ever sees [`NOT_EXISTS`] for
//! a missing entry. MOVE relies on that identity when it checks the
//! destination before renaming.

use dav_server::fs::FsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or starting the server.
#[derive(Debug, Error)]
pub enum DavServeError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Listen address could not be parsed or resolved.
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// Root directory is missing or not a directory.
    #[error("Invalid root directory {}: {reason}", .path.display())]
    InvalidRoot {
        /// The configured root.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Certificate or key could not be loaded.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// Result type for server setup.
pub type DavServeResult<T> = Result<T, DavServeError>;

/// The one error value the adapter reports for a missing entry.
pub const NOT_EXISTS: FsError = FsError::NotFound;

/// Returns true if `err` means the entry does not exist.
pub fn is_not_exists(err: &FsError) -> bool {
    matches!(err, FsError::NotFound)
}

/// Returns true if an OS-level error means the entry does not exist.
///
/// Only `ENOENT`-style errors qualify. A path component that is a file
/// (`ENOTDIR`) is a different condition and is left to the engine.
pub fn io_is_not_exists(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Replaces any not-exists error with [`NOT_EXISTS`]; everything else
/// passes through untouched.
pub fn canonicalize(err: FsError) -> FsError {
    if is_not_exists(&err) { NOT_EXISTS } else { err }
}
