//! Configuration file support for the davserve CLI.
//!
//! Configuration is stored at `~/.config/davserve/config.toml` (XDG standard)
//! or `~/Library/Application Support/davserve/config.toml` on macOS. Set
//! `DAVSERVE_CONFIG_DIR` to look in another directory instead.
//!
//! # Example configuration
//!
//! ```toml
//! [server]
//! dir = "/srv/www"
//! http = ":8080"
//! read_only = true
//!
//! [tls]
//! enabled = true
//! cert_file = "/etc/davserve/cert.pem"
//! key_file = "/etc/davserve/key.pem"
//!
//! [auth]
//! user = "alice"
//! password = "secret"
//! ```
//!
//! Every key is optional. Command-line flags and environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "DAVSERVE_CONFIG_DIR";

/// Main configuration structure
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub tls: TlsSection,

    #[serde(default)]
    pub auth: AuthSection,
}

/// `[server]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Directory to serve
    pub dir: Option<PathBuf>,

    /// Listen address
    pub http: Option<String>,

    /// Refuse mutating methods
    pub read_only: Option<bool>,
}

/// `[tls]` table
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsSection {
    pub enabled: Option<bool>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

/// `[auth]` table
#[derive(Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSection")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl FileConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// location is tried and a missing file yields an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let Some(path) = config_path() else {
                    tracing::debug!("No home directory, skipping config file");
                    return Ok(Self::default());
                };
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "No config file");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Get the path to the default configuration file.
///
/// Returns `None` when no home directory can be determined.
pub fn config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir).join("config.toml"));
    }

    let base_dirs = directories::BaseDirs::new()?;

    #[cfg(target_os = "macos")]
    {
        Some(
            base_dirs
                .home_dir()
                .join("Library/Application Support/davserve/config.toml"),
        )
    }

    #[cfg(not(target_os = "macos"))]
    {
        Some(base_dirs.config_dir().join("davserve").join("config.toml"))
    }
}
