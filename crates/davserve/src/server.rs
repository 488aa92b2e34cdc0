//! HTTP server lifecycle management.
//!
//! [`WebDavServer`] binds the listener, optionally wraps each connection in
//! TLS, and serves it with hyper's auto HTTP/1 + HTTP/2 builder on its own
//! task. Requests are answered by a shared [`Dispatcher`].

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::DavServeResult;
use crate::tls;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

/// A running WebDAV server instance.
pub struct WebDavServer {
    /// The actual bound address.
    pub addr: SocketAddr,
    tls: bool,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Server task handle.
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl WebDavServer {
    /// Start a new WebDAV server.
    ///
    /// Fails if the root is not a directory, the listen address does not
    /// parse, the TLS material cannot be loaded, or the bind fails.
    pub async fn start(config: Arc<ServerConfig>) -> DavServeResult<Self> {
        config.validate_async().await?;
        let addr = config.resolve_listen_addr().await?;

        let acceptor = if config.tls.enabled {
            Some(tls::load_acceptor(&config.tls.cert_file, &config.tls.key_file)?)
        } else {
            None
        };

        let listener = TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;
        let tls = acceptor.is_some();

        info!(
            addr = %actual_addr,
            root = %config.root.display(),
            tls,
            auth = config.credentials.is_enabled(),
            read_only = config.read_only,
            "Starting WebDAV server"
        );

        let dispatcher = Arc::new(Dispatcher::new(config));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_handle = tokio::spawn(async move {
            tokio::select! {
                () = run_server(listener, acceptor, dispatcher) => {
                    debug!("Server loop ended");
                }
                _ = shutdown_rx => {
                    info!("Received shutdown signal");
                }
            }
        });

        Ok(Self {
            addr: actual_addr,
            tls,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Get the URL for this server.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.addr)
    }

    /// Stop the server.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        info!("WebDAV server stopped");
    }

    /// Stop the server synchronously (for use in Drop).
    fn stop_sync(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WebDavServer {
    fn drop(&mut self) {
        self.stop_sync();
    }
}

/// Run the server accept loop.
async fn run_server(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    dispatcher: Arc<Dispatcher>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let dispatcher = dispatcher.clone();
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    match acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(stream) => serve_connection(stream, peer_addr, dispatcher).await,
                            Err(e) => {
                                warn!(peer = %peer_addr, error = %e, "TLS handshake failed");
                            }
                        },
                        None => serve_connection(stream, peer_addr, dispatcher).await,
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

async fn serve_connection<S>(stream: S, peer_addr: SocketAddr, dispatcher: Arc<Dispatcher>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move { Ok::<_, Infallible>(dispatcher.handle(req).await) }
    });

    if let Err(e) = auto::Builder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
    {
        warn!(peer = %peer_addr, error = %e, "HTTP connection error");
    }
}
