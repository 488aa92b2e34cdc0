//! Static single-user HTTP Basic authentication.

use crate::body::{empty, text_error, ResponseBody};
use crate::config::Credentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

/// `WWW-Authenticate` value sent when credentials are missing.
pub const CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Body sent when credentials were supplied but do not match.
pub const MISMATCH_MESSAGE: &str = "WebDAV: need authorized!";

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header, or one that is not well-formed Basic.
    Missing,
    /// Well-formed Basic credentials that do not match.
    Mismatch,
}

impl AuthFailure {
    /// Builds the 401 response. Only [`AuthFailure::Missing`] carries the
    /// challenge header.
    pub fn into_response(self) -> Response<ResponseBody> {
        match self {
            AuthFailure::Missing => {
                let mut resp = Response::new(empty());
                *resp.status_mut() = StatusCode::UNAUTHORIZED;
                resp.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(CHALLENGE),
                );
                resp
            }
            AuthFailure::Mismatch => text_error(StatusCode::UNAUTHORIZED, MISMATCH_MESSAGE),
        }
    }
}

/// Checks request headers against the configured credentials.
///
/// Always succeeds when authentication is disabled, i.e. when either the
/// username or the password is empty.
pub fn authenticate(credentials: &Credentials, headers: &HeaderMap) -> Result<(), AuthFailure> {
    if !credentials.is_enabled() {
        return Ok(());
    }
    let (username, password) = basic_credentials(headers).ok_or(AuthFailure::Missing)?;
    if credentials.matches(&username, &password) {
        Ok(())
    } else {
        Err(AuthFailure::Mismatch)
    }
}

/// Extracts the username and password from a Basic `Authorization` header.
///
/// The scheme name is matched case-insensitively. The password is everything
/// after the first `:` and may itself contain colons.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
