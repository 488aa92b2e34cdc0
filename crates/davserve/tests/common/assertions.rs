//! Custom assertions for davserve integration tests.

use crate::common::TestServer;
use reqwest::StatusCode;

/// Assert that a file is served with the expected content.
pub async fn assert_file_content(server: &TestServer, path: &str, expected: &[u8]) {
    match server.get_bytes(path).await {
        Ok(actual) => {
            assert_eq!(
                actual.as_ref(),
                expected,
                "File content mismatch at {}: expected {} bytes, got {} bytes",
                path,
                expected.len(),
                actual.len()
            );
        }
        Err((status, body)) => {
            panic!("Failed to read file {path}: status={status}, body={body}");
        }
    }
}

/// Assert that a file on disk has the expected content.
pub fn assert_disk_content(server: &TestServer, path: &str, expected: &[u8]) {
    let actual = std::fs::read(server.disk_path(path))
        .unwrap_or_else(|e| panic!("Failed to read {path} from disk: {e}"));
    assert_eq!(actual, expected, "Disk content mismatch at {path}");
}

/// Assert that a path returns 404 Not Found.
pub async fn assert_not_found(server: &TestServer, path: &str) {
    let resp = server.get(path).await;
    assert_eq!(
        resp.status(),
        StatusCode::NOT_FOUND,
        "Expected 404 for {}, got {}",
        path,
        resp.status()
    );
}

/// Assert that a response has a specific status code.
pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected status {expected}, got {actual}"
    );
}

/// Assert that a 207 PROPFIND answer came back, meaning the engine handled
/// the request.
pub fn assert_multistatus(actual: StatusCode, context: &str) {
    assert_status(actual, StatusCode::MULTI_STATUS, context);
}

/// Extract `(href, label)` pairs from an HTML listing body, in order.
pub fn listing_links(body: &str) -> Vec<(String, String)> {
    let mut links = Vec::new();
    for line in body.lines() {
        let Some(rest) = line.strip_prefix("<a href=\"") else {
            continue;
        };
        let Some((href, rest)) = rest.split_once("\">") else {
            continue;
        };
        let Some(label) = rest.strip_suffix("</a>") else {
            continue;
        };
        links.push((href.to_string(), label.to_string()));
    }
    links
}

/// Assert that a listing shows exactly the given labels, in order.
pub fn assert_listing_labels(body: &str, expected: &[&str]) {
    let labels: Vec<String> = listing_links(body).into_iter().map(|(_, label)| label).collect();
    assert_eq!(labels, expected, "Listing labels mismatch in:\n{body}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_links() {
        let body = "<pre>\n<a href=\"a.txt\">a.txt</a>\n<a href=\"sub/\">sub/</a>\n</pre>\n";
        assert_eq!(
            listing_links(body),
            vec![
                ("a.txt".to_string(), "a.txt".to_string()),
                ("sub/".to_string(), "sub/".to_string()),
            ]
        );
    }
}
