#![deny(unsafe_code)]

mod config;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use davserve::config::{DEFAULT_CERT_FILE, DEFAULT_KEY_FILE, DEFAULT_LISTEN};
use davserve::{ServerConfig, WebDavServer};
use tracing_subscriber::EnvFilter;
#[cfg(feature = "tokio-console")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::FileConfig;

/// Serve a directory over WebDAV
#[derive(Parser, Debug)]
#[command(name = "davserve")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Serve the current directory on port 8080
    davserve --http :8080

    # Read-only share with a password (prefer DAVSERVE_PASSWORD over the flag)
    DAVSERVE_PASSWORD=secret davserve --dir /srv/share --user alice --read-only

    # HTTPS with an existing certificate
    davserve --https-mode --https-cert-file cert.pem --https-key-file key.pem
")]
struct Cli {
    /// Directory to serve [default: .]
    #[arg(long, value_name = "PATH", env = "DAVSERVE_DIR")]
    dir: Option<PathBuf>,

    /// Listen address (host:port, :port or [v6]:port) [default: :80]
    #[arg(long, value_name = "ADDR", env = "DAVSERVE_HTTP")]
    http: Option<String>,

    /// Serve HTTPS instead of HTTP
    #[arg(long, env = "DAVSERVE_HTTPS_MODE")]
    https_mode: bool,

    /// PEM certificate chain for HTTPS [default: cert.pem]
    #[arg(long, value_name = "PATH", env = "DAVSERVE_HTTPS_CERT_FILE")]
    https_cert_file: Option<PathBuf>,

    /// PEM private key for HTTPS [default: key.pem]
    #[arg(long, value_name = "PATH", env = "DAVSERVE_HTTPS_KEY_FILE")]
    https_key_file: Option<PathBuf>,

    /// Username for Basic auth (needs --password too)
    #[arg(long, value_name = "NAME", env = "DAVSERVE_USER")]
    user: Option<String>,

    /// Password for Basic auth (insecure, prefer DAVSERVE_PASSWORD)
    #[arg(long, value_name = "PASS", env = "DAVSERVE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Refuse PUT, DELETE, PROPPATCH, MKCOL, COPY and MOVE
    #[arg(long, env = "DAVSERVE_READ_ONLY")]
    read_only: bool,

    /// Configuration file [default: platform config dir]
    #[arg(long, value_name = "PATH", env = "DAVSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Layer flags and environment over the config file over built-in
    /// defaults.
    fn server_config(&self, file: FileConfig) -> ServerConfig {
        let root = self
            .dir
            .clone()
            .or(file.server.dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let listen = self
            .http
            .clone()
            .or(file.server.http)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let read_only = self.read_only || file.server.read_only.unwrap_or(false);

        let mut config = ServerConfig::new(root)
            .with_listen(listen)
            .with_read_only(read_only)
            .with_credentials(
                self.user.clone().or(file.auth.user).unwrap_or_default(),
                self.password.clone().or(file.auth.password).unwrap_or_default(),
            );

        if self.https_mode || file.tls.enabled.unwrap_or(false) {
            let cert = self
                .https_cert_file
                .clone()
                .or(file.tls.cert_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CERT_FILE));
            let key = self
                .https_key_file
                .clone()
                .or(file.tls.key_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE));
            config = config.with_tls(cert, key);
        }

        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up tracing based on verbosity (skip if quiet)
    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let file = FileConfig::load(cli.config.as_deref())?;
    let config = cli.server_config(file);

    config.validate()?;
    config.listen_addr()?;

    if config.credentials.is_partial() {
        tracing::warn!("Basic auth needs both a user and a password; serving without auth");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(serve(config, cli.quiet))
}

async fn serve(config: ServerConfig, quiet: bool) -> Result<()> {
    let root = config.root.clone();
    let server = WebDavServer::start(Arc::new(config))
        .await
        .context("Failed to start WebDAV server")?;

    if !quiet {
        eprintln!("Serving {} at {}", root.display(), server.url());
        eprintln!("Press Ctrl+C to stop");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    tracing::info!("Shutting down");
    server.stop().await;
    Ok(())
}

/// Set up tracing/logging based on verbosity level. `RUST_LOG` wins when set.
fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    #[cfg(feature = "tokio-console")]
    {
        use tracing_subscriber::Layer;

        tracing_subscriber::registry()
            .with(console_subscriber::spawn())
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_filter(filter))
            .init();
        tracing::info!("tokio-console enabled");
    }

    #[cfg(not(feature = "tokio-console"))]
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
