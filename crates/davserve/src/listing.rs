//! Browser-friendly directory index.
//!
//! A plain `GET` on a collection is answered with a minimal HTML listing so
//! the share can be browsed without a WebDAV client. Requests that carry a
//! `Depth` or `Translate` header come from WebDAV clients and are never
//! intercepted.
//!
//! Entries are listed in byte order of their names. The order returned by
//! the operating system is not stable across filesystems, so it is not used.

use crate::body::{full, text_error, ResponseBody};
use crate::filesystem::ServeFs;
use dav_server::davpath::DavPath;
use dav_server::fs::{DavDirEntry, DavFileSystem, FsError, FsStream, ReadDirMeta};
use futures::StreamExt;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Response, StatusCode, Uri};
use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Body sent when the entry list cannot be read.
pub const READ_ERROR_MESSAGE: &str = "Error reading directory";

/// Characters escaped in an entry link. The link is a single relative path
/// segment, so `/` is escaped along with everything that would end the
/// segment or the attribute.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Result of offering a request to the listing responder.
pub enum Listing {
    /// A response was produced (listing, redirect or read error).
    Handled(Response<ResponseBody>),
    /// Not a listing request; pass it on.
    NotHandled,
}

/// One line of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Entry name as stored on disk. Not necessarily UTF-8.
    pub name: Vec<u8>,
    /// Entry is a directory (symlinks are not followed).
    pub is_dir: bool,
    /// Entry is a symbolic link.
    pub is_symlink: bool,
}

impl ListingEntry {
    /// Link target: the name, with a trailing `/` for directories.
    ///
    /// Invalid UTF-8 shows up as U+FFFD here. [`Self::href`] keeps the raw
    /// bytes.
    pub fn link(&self) -> String {
        let mut link = String::from_utf8_lossy(&self.name).into_owned();
        if self.is_dir {
            link.push('/');
        }
        link
    }

    /// Visible text: the link, with a trailing `@` for symlinks.
    pub fn label(&self) -> String {
        let mut label = self.link();
        if self.is_symlink {
            label.push('@');
        }
        label
    }

    /// Percent-encoded link target, byte for byte.
    pub fn href(&self) -> String {
        let mut href = percent_encode(&self.name, SEGMENT).to_string();
        if self.is_dir {
            href.push('/');
        }
        href
    }
}

/// Returns true for a navigational `GET`: no `Depth` and no `Translate`.
///
/// A header that is present but empty counts as absent.
pub fn wants_listing(method: &Method, headers: &HeaderMap) -> bool {
    *method == Method::GET && !has_value(headers, "depth") && !has_value(headers, "translate")
}

fn has_value(headers: &HeaderMap, name: &str) -> bool {
    headers.get(name).is_some_and(|v| !v.is_empty())
}

/// Answers a request with a listing or redirect if it targets a directory.
///
/// Returns [`Listing::NotHandled`] when the request is not a listing request,
/// the path cannot be parsed, the entry is missing or not a directory, or the
/// directory cannot be opened. The engine then produces its own response.
pub async fn respond<F>(fs: &ServeFs<F>, method: &Method, uri: &Uri, headers: &HeaderMap) -> Listing
where
    F: DavFileSystem + Clone + Sync + 'static,
{
    if !wants_listing(method, headers) {
        return Listing::NotHandled;
    }

    let raw_path = uri.path();
    let Ok(path) = DavPath::new(raw_path) else {
        debug!(path = %raw_path, "Unparseable path, not listing");
        return Listing::NotHandled;
    };

    match fs.metadata(&path).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Listing::NotHandled,
        Err(e) => {
            debug!(path = %raw_path, error = ?e, "Stat failed, not listing");
            return Listing::NotHandled;
        }
    }

    if !raw_path.ends_with('/') {
        return redirect(&format!("{raw_path}/"));
    }

    let stream = match fs.read_dir(&path, ReadDirMeta::DataSymlink).await {
        Ok(stream) => stream,
        Err(e) => {
            debug!(path = %raw_path, error = ?e, "Open failed, not listing");
            return Listing::NotHandled;
        }
    };

    match read_entries(stream).await {
        Ok(mut entries) => {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            debug!(path = %raw_path, count = entries.len(), "Serving directory listing");
            Listing::Handled(html_response(&render(&entries)))
        }
        Err(e) => {
            warn!(path = %raw_path, error = ?e, "Failed to read directory");
            Listing::Handled(text_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                READ_ERROR_MESSAGE,
            ))
        }
    }
}

async fn read_entries(
    mut stream: FsStream<Box<dyn DavDirEntry>>,
) -> Result<Vec<ListingEntry>, FsError> {
    let mut entries = Vec::new();
    while let Some(entry) = stream.next().await {
        let entry = entry?;
        let meta = entry.metadata().await?;
        entries.push(ListingEntry {
            name: entry.name(),
            is_dir: meta.is_dir(),
            is_symlink: meta.is_symlink(),
        });
    }
    Ok(entries)
}

/// Renders the listing page: one anchor per entry inside a `<pre>` block.
pub fn render(entries: &[ListingEntry]) -> String {
    let mut html = String::from("<pre>\n");
    for entry in entries {
        let _ = writeln!(
            html,
            "<a href=\"{}\">{}</a>",
            entry.href(),
            escape_html(&entry.label())
        );
    }
    html.push_str("</pre>\n");
    html
}

fn html_response(html: &str) -> Response<ResponseBody> {
    let mut resp = Response::new(full(html.to_owned()));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

fn redirect(location: &str) -> Listing {
    let Ok(value) = HeaderValue::from_str(location) else {
        return Listing::NotHandled;
    };
    let body = format!("<a href=\"{}\">Found</a>.\n", escape_html(location));
    let mut resp = html_response(&body);
    *resp.status_mut() = StatusCode::FOUND;
    resp.headers_mut().insert(header::LOCATION, value);
    Listing::Handled(resp)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
