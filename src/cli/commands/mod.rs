//! Command implementations.

pub mod attachments;
pub mod completions;
pub mod page;
pub mod version;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::remote::{CallOptions, HttpWikiClient};
use crate::sync::{OpFailure, SyncManager};

/// Build the sync manager and call options from the global flags.
pub(crate) fn build(cli: &Cli) -> Result<(SyncManager<HttpWikiClient>, CallOptions)> {
    let config = Config::resolve(
        cli.base_url.clone(),
        cli.token.clone(),
        cli.cache_dir.clone(),
        cli.timeout,
    )?;
    let client = HttpWikiClient::new(&config.base_url, config.token.clone());
    let manager = SyncManager::new(client, config.cache_root.clone());
    let opts = CallOptions {
        timeout: config.timeout,
        cancel: None,
    };
    Ok((manager, opts))
}

/// Create the async runtime commands run sync operations on.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Surface the event-log path of a failed operation, then unwrap the
/// classified error for the caller's exit-code handling.
pub(crate) fn report_failure(failure: OpFailure, json: bool) -> Error {
    if let Some(path) = &failure.log_path {
        if json {
            eprintln!(
                "{}",
                serde_json::json!({ "syncLog": path.display().to_string() })
            );
        } else {
            eprintln!("  Log: {}", path.display());
        }
    }
    failure.error
}
