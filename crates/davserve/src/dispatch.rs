//! Per-request policy gate in front of the WebDAV engine.
//!
//! Every request passes through the same fixed sequence:
//!
//! 1. Basic authentication, when both username and password are configured.
//! 2. Browser listing negotiation (see [`crate::listing`]).
//! 3. Read-only enforcement, when configured.
//! 4. Delegation to [`DavHandler`].
//!
//! Each step either ends the request with a response or falls through to the
//! next one. Nothing here returns an error to the transport.

use crate::auth::{authenticate, AuthFailure};
use crate::body::{text_error, BoxError, ResponseBody};
use crate::config::ServerConfig;
use crate::filesystem::ServeFs;
use crate::listing::{self, Listing};
use dav_server::memls::MemLs;
use dav_server::DavHandler;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{self, HeaderMap};
use hyper::{Method, Request, Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Body sent with a 403 when a mutating method hits a read-only server.
pub const READ_ONLY_MESSAGE: &str = "WebDAV: Read Only!!!";

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// HTML directory listing.
    Listing,
    /// Redirect to the trailing-slash form of a directory path.
    Redirect,
    /// Directory entries could not be read.
    ListingFailed,
    /// No usable credentials; challenge sent.
    Challenge,
    /// Credentials supplied but wrong.
    Rejected,
    /// Mutating method refused in read-only mode.
    ReadOnly,
    /// Handed to the WebDAV engine.
    Delegated,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Listing => "listing",
            Outcome::Redirect => "redirect",
            Outcome::ListingFailed => "listing_failed",
            Outcome::Challenge => "challenge",
            Outcome::Rejected => "rejected",
            Outcome::ReadOnly => "read_only",
            Outcome::Delegated => "delegated",
        }
    }

    fn of_listing(status: StatusCode) -> Self {
        if status.is_redirection() {
            Outcome::Redirect
        } else if status.is_success() {
            Outcome::Listing
        } else {
            Outcome::ListingFailed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for the methods refused in read-only mode.
///
/// LOCK and UNLOCK stay allowed so clients that lock before reading keep
/// working.
pub fn is_blocked_when_read_only(method: &Method) -> bool {
    matches!(
        method.as_str(),
        "PUT" | "DELETE" | "PROPPATCH" | "MKCOL" | "COPY" | "MOVE"
    )
}

/// Applies the server policy to each request and forwards the rest.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    fs: ServeFs,
    dav: DavHandler,
}

impl Dispatcher {
    /// Builds the engine over the configured root with an in-memory lock
    /// manager.
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let fs = ServeFs::local(&config.root);
        let dav = DavHandler::builder()
            .filesystem(Box::new(fs.clone()))
            .locksystem(MemLs::new())
            .build_handler();
        Self { config, fs, dav }
    }

    /// The configuration this dispatcher enforces.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Answers one request.
    pub async fn handle(&self, req: Request<Incoming>) -> Response<ResponseBody> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let user_agent = user_agent(req.headers());

        let (outcome, resp) = self.route(req).await;

        debug!(
            %method,
            path = %path,
            user_agent = %user_agent,
            outcome = %outcome,
            status = resp.status().as_u16(),
            "Request handled"
        );
        resp
    }

    async fn route(&self, req: Request<Incoming>) -> (Outcome, Response<ResponseBody>) {
        if let Err(failure) = authenticate(&self.config.credentials, req.headers()) {
            let outcome = match failure {
                AuthFailure::Missing => Outcome::Challenge,
                AuthFailure::Mismatch => Outcome::Rejected,
            };
            return (outcome, failure.into_response());
        }

        if let Listing::Handled(resp) =
            listing::respond(&self.fs, req.method(), req.uri(), req.headers()).await
        {
            return (Outcome::of_listing(resp.status()), resp);
        }

        if self.config.read_only && is_blocked_when_read_only(req.method()) {
            return (
                Outcome::ReadOnly,
                text_error(StatusCode::FORBIDDEN, READ_ONLY_MESSAGE),
            );
        }

        let resp = self
            .dav
            .handle(req)
            .await
            .map(|body| body.map_err(BoxError::from).boxed_unsync());
        (Outcome::Delegated, resp)
    }
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}
