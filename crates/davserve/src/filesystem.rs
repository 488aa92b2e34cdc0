//! Filesystem adapter handed to the WebDAV engine.
//!
//! [`ServeFs`] wraps a rooted filesystem (by default
//! [`LocalFs`](dav_server::localfs::LocalFs)) and delegates every operation
//! to it. The existence checks (`metadata`, `symlink_metadata`, `open`,
//! `read_dir`) additionally run their errors through
//! [`canonicalize`](crate::error::canonicalize), so a missing entry is always
//! reported as [`NOT_EXISTS`](crate::error::NOT_EXISTS). The engine's MOVE
//! and COPY handlers decide between "create" and "overwrite" on exactly that
//! value.

use crate::error::canonicalize;
use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsFuture, FsStream, OpenOptions,
    ReadDirMeta,
};
use dav_server::localfs::LocalFs;
use std::path::Path;
use tracing::{instrument, trace};

/// Filesystem adapter with canonical not-found errors.
#[derive(Clone)]
pub struct ServeFs<F = LocalFs> {
    inner: F,
}

impl ServeFs<LocalFs> {
    /// Serves the directory tree under `root`. New files and directories
    /// are created world-readable, subject to the process umask.
    pub fn local(root: &Path) -> Self {
        let inner = LocalFs::new(root, true, false, false);
        Self { inner: *inner }
    }
}

impl<F> ServeFs<F>
where
    F: DavFileSystem + Clone,
{
    /// Wraps an arbitrary rooted filesystem.
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F> DavFileSystem for ServeFs<F>
where
    F: DavFileSystem + Clone + Sync + 'static,
{
    #[instrument(level = "trace", skip(self, options), fields(path = %path.as_url_string()))]
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        Box::pin(async move {
            self.inner.open(path, options).await.map_err(|e| {
                trace!(error = ?e, "open failed");
                canonicalize(e)
            })
        })
    }

    #[instrument(level = "trace", skip(self, meta), fields(path = %path.as_url_string()))]
    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        Box::pin(async move {
            self.inner.read_dir(path, meta).await.map_err(|e| {
                trace!(error = ?e, "read_dir failed");
                canonicalize(e)
            })
        })
    }

    #[instrument(level = "trace", skip(self), fields(path = %path.as_url_string()))]
    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            self.inner.metadata(path).await.map_err(|e| {
                trace!(error = ?e, "metadata failed");
                canonicalize(e)
            })
        })
    }

    #[instrument(level = "trace", skip(self), fields(path = %path.as_url_string()))]
    fn symlink_metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            self.inner.symlink_metadata(path).await.map_err(|e| {
                trace!(error = ?e, "symlink_metadata failed");
                canonicalize(e)
            })
        })
    }

    fn create_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.create_dir(path)
    }

    fn remove_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.remove_dir(path)
    }

    fn remove_file<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.remove_file(path)
    }

    fn rename<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.rename(from, to)
    }

    fn copy<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.copy(from, to)
    }
}
