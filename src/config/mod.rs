//! Configuration management.
//!
//! Resolution order for every setting: CLI flag > environment variable >
//! default. The flags declare their environment variables through clap
//! (`WIKISYNC_BASE_URL`, `WIKISYNC_TOKEN`, `WIKISYNC_CACHE_DIR`), so this
//! module only validates what arrived and fills in the defaults.
//!
//! The cache root defaults to the platform data directory (e.g.
//! `~/.local/share/wikisync` on Linux), falling back to `~/.wikisync` when
//! the platform directories cannot be resolved.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::remote::DEFAULT_TIMEOUT;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote wiki base URL, e.g. `https://wiki.example.com`.
    pub base_url: String,
    /// API bearer token.
    pub token: String,
    /// Root directory of the local cache.
    pub cache_root: PathBuf,
    /// Deadline for each remote call.
    pub timeout: Duration,
}

impl Config {
    /// Validate CLI-provided values and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns a config error when the base URL or token is absent.
    pub fn resolve(
        base_url: Option<String>,
        token: Option<String>,
        cache_dir: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config("remote base URL not configured".to_string()))?;
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("API token not configured (WIKISYNC_TOKEN)".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            cache_root: resolve_cache_root(cache_dir.as_deref()),
            timeout: timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
        })
    }
}

/// Resolve the cache root directory.
///
/// An explicit flag wins; otherwise the platform data directory; otherwise
/// `~/.wikisync`.
#[must_use]
pub fn resolve_cache_root(flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }

    if let Some(dirs) = directories::ProjectDirs::from("dev", "greenfieldlabs", "wikisync") {
        return dirs.data_dir().to_path_buf();
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".wikisync")
}
