//! Test server harness for davserve integration tests.
//!
//! Provides a `TestServer` that runs a real server on an ephemeral port over
//! a temporary root directory, along with HTTP convenience methods.

use bytes::Bytes;
use davserve::{ServerConfig, WebDavServer};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Username used by tests that enable authentication.
pub const TEST_USER: &str = "alice";

/// Password used by tests that enable authentication.
pub const TEST_PASSWORD: &str = "test-password-12345";

/// Test server with HTTP client and automatic cleanup.
pub struct TestServer {
    /// The running server.
    server: WebDavServer,
    /// HTTP client for making requests. Never follows redirects.
    client: Client,
    /// Base URL for the server.
    pub base_url: String,
    /// Root directory (cleaned up on drop).
    root: TempDir,
}

impl TestServer {
    /// Start a server with default settings over an empty root.
    pub async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    /// Start a server, letting the caller adjust the configuration.
    ///
    /// The root and listen address are filled in before `configure` runs.
    pub async fn start_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let config = configure(ServerConfig::new(root.path()).with_listen("127.0.0.1:0"));

        let server = WebDavServer::start(Arc::new(config))
            .await
            .expect("Failed to start WebDAV server");

        let base_url = server.url();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()
            .expect("Failed to create HTTP client");

        let test_server = Self {
            server,
            client,
            base_url,
            root,
        };

        test_server.wait_ready().await;

        test_server
    }

    /// Start a server over HTTPS with a freshly generated self-signed
    /// certificate.
    pub async fn start_tls() -> Self {
        let certs = TempDir::new().expect("Failed to create temp dir");
        let (cert_file, key_file) = write_self_signed(certs.path());

        // The acceptor reads the PEM files at startup, so they can go away
        // once the server is running.
        Self::start_with(|config| config.with_tls(cert_file, key_file)).await
    }

    /// Wait for the server to accept connections.
    async fn wait_ready(&self) {
        for _ in 0..50 {
            if self
                .client
                .request(Method::OPTIONS, &self.base_url)
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready in time");
    }

    /// The directory being served.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Path on disk for a URL path.
    pub fn disk_path(&self, path: &str) -> PathBuf {
        self.root.path().join(path.trim_start_matches('/'))
    }

    /// Create a file under the root, creating parent directories as needed.
    pub fn write_file(&self, path: &str, content: &[u8]) {
        let full = self.disk_path(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(full, content).expect("Failed to write file");
    }

    /// Create a directory under the root.
    pub fn create_dir(&self, path: &str) {
        std::fs::create_dir_all(self.disk_path(path)).expect("Failed to create dir");
    }

    /// Build a full URL from a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request without credentials or extra headers.
    pub fn request(&self, method: &str, path: &str) -> RequestBuilder {
        self.client
            .request(Method::from_bytes(method.as_bytes()).unwrap(), self.url(path))
    }

    // ========== HTTP Convenience Methods ==========

    /// GET a path.
    pub async fn get(&self, path: &str) -> Response {
        self.request("GET", path)
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET a path and return status and body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let resp = self.get(path).await;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (status, body)
    }

    /// GET a file's contents as bytes.
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, (StatusCode, String)> {
        let resp = self.get(path).await;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.bytes().await.expect("Failed to read response bytes"))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err((status, body))
        }
    }

    /// PUT file contents.
    pub async fn put(&self, path: &str, body: impl Into<reqwest::Body>) -> Response {
        self.request("PUT", path)
            .body(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    /// DELETE a file or directory.
    pub async fn delete(&self, path: &str) -> Response {
        self.request("DELETE", path)
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// MKCOL (create directory).
    pub async fn mkcol(&self, path: &str) -> Response {
        self.request("MKCOL", path)
            .send()
            .await
            .expect("MKCOL request failed")
    }

    /// PROPFIND (list directory or get properties).
    pub async fn propfind(&self, path: &str, depth: &str) -> Response {
        self.request("PROPFIND", path)
            .header("Depth", depth)
            .send()
            .await
            .expect("PROPFIND request failed")
    }

    /// PROPPATCH setting one dead property.
    pub async fn proppatch(&self, path: &str) -> Response {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propertyupdate xmlns:D="DAV:" xmlns:Z="urn:davserve-test">
  <D:set><D:prop><Z:color>blue</Z:color></D:prop></D:set>
</D:propertyupdate>"#;
        self.request("PROPPATCH", path)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await
            .expect("PROPPATCH request failed")
    }

    /// LOCK a resource exclusively.
    pub async fn lock(&self, path: &str) -> Response {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
  <D:owner>davserve-test</D:owner>
</D:lockinfo>"#;
        self.request("LOCK", path)
            .header("Content-Type", "application/xml")
            .header("Timeout", "Second-60")
            .body(body)
            .send()
            .await
            .expect("LOCK request failed")
    }

    /// UNLOCK with the given lock token (including angle brackets).
    pub async fn unlock(&self, path: &str, token: &str) -> Response {
        self.request("UNLOCK", path)
            .header("Lock-Token", token)
            .send()
            .await
            .expect("UNLOCK request failed")
    }

    /// COPY a file or directory.
    pub async fn copy(&self, from: &str, to: &str, overwrite: bool) -> Response {
        self.request("COPY", from)
            .header("Destination", self.url(to))
            .header("Overwrite", if overwrite { "T" } else { "F" })
            .send()
            .await
            .expect("COPY request failed")
    }

    /// MOVE a file or directory.
    pub async fn move_(&self, from: &str, to: &str, overwrite: bool) -> Response {
        self.request("MOVE", from)
            .header("Destination", self.url(to))
            .header("Overwrite", if overwrite { "T" } else { "F" })
            .send()
            .await
            .expect("MOVE request failed")
    }

    /// Stop the server explicitly (otherwise happens on drop).
    pub async fn stop(self) {
        self.server.stop().await;
    }
}

/// Write a self-signed certificate for `localhost` into `dir`.
pub fn write_self_signed(dir: &Path) -> (PathBuf, PathBuf) {
    let certified = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .expect("Failed to generate certificate");
    let cert_file = dir.join("cert.pem");
    let key_file = dir.join("key.pem");
    std::fs::write(&cert_file, certified.cert.pem()).expect("Failed to write cert");
    std::fs::write(&key_file, certified.key_pair.serialize_pem()).expect("Failed to write key");
    (cert_file, key_file)
}
