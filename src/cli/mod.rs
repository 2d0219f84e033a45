//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Sync remote wiki pages and attachments with a local cache
#[derive(Parser, Debug)]
#[command(name = "wikisync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Remote wiki base URL (e.g. https://wiki.example.com)
    #[arg(long, global = true, env = "WIKISYNC_BASE_URL")]
    pub base_url: Option<String>,

    /// API bearer token
    #[arg(long, global = true, env = "WIKISYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Cache root directory (default: platform data dir)
    #[arg(long, global = true, env = "WIKISYNC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Per-call timeout in seconds (default: 30)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output as JSON (for agent integration)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page body operations
    Page {
        #[command(subcommand)]
        command: PageCommands,
    },

    /// Attachment operations
    Attachments {
        #[command(subcommand)]
        command: AttachmentCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum PageCommands {
    /// Download the page body into the cache
    Download {
        /// Page id or URL
        page: String,
    },

    /// Upload the locally edited body back to the remote
    Upload {
        /// Page id or URL
        page: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AttachmentCommands {
    /// Download attachments into the cache
    Download {
        /// Page id or URL
        page: String,

        /// Restrict to specific attachment titles (repeatable).
        /// A restricted scan never deletes anything locally.
        #[arg(long = "only", value_name = "TITLE")]
        only: Vec<String>,
    },

    /// Upload locally changed attachments
    Upload {
        /// Page id or URL
        page: String,

        /// Restrict to specific attachment titles (repeatable)
        #[arg(long = "only", value_name = "TITLE")]
        only: Vec<String>,
    },
}
