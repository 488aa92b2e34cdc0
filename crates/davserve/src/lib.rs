//! WebDAV file server with Basic auth, read-only mode and browser listings.
//!
//! This crate serves a local directory tree over WebDAV. The protocol itself
//! is handled by [`dav_server`]; this crate adds the policy layer in front of
//! it and the filesystem adapter behind it.
//!
//! # How It Works
//!
//! Every request goes through a [`Dispatcher`]:
//! 1. Optional HTTP Basic authentication against one static credential pair
//! 2. A browser-friendly HTML listing for plain `GET`s on directories
//! 3. Optional read-only enforcement for content-mutating methods
//! 4. Everything else is handed to the WebDAV engine
//!
//! The engine reaches the disk through [`ServeFs`], which reports every
//! missing entry as the same error so MOVE and COPY can tell "create" from
//! "overwrite".
//!
//! # Example
//!
//! ```no_run
//! use davserve::{ServerConfig, WebDavServer};
//! use std::sync::Arc;
//!
//! # async fn run() -> davserve::DavServeResult<()> {
//! let config = ServerConfig::new("/srv/share")
//!     .with_listen("127.0.0.1:8080")
//!     .with_credentials("alice", "secret")
//!     .with_read_only(true);
//!
//! let server = WebDavServer::start(Arc::new(config)).await?;
//! println!("Serving on {}", server.url());
//! server.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Authentication is only enabled when both a username and a password are
//! set. Without TLS, Basic credentials travel in the clear.

pub mod auth;
mod body;
pub mod config;
pub mod dispatch;
mod error;
pub mod filesystem;
pub mod listing;
mod server;
pub mod tls;

// Public exports
pub use auth::{AuthFailure, CHALLENGE, MISMATCH_MESSAGE};
pub use body::{BoxError, ResponseBody};
pub use config::{Credentials, ServerConfig, TlsConfig};
pub use dispatch::{Dispatcher, Outcome, READ_ONLY_MESSAGE};
pub use error::{
    DavServeError, DavServeResult, NOT_EXISTS, canonicalize, io_is_not_exists, is_not_exists,
};
pub use filesystem::ServeFs;
pub use listing::{Listing, ListingEntry};
pub use server::WebDavServer;
