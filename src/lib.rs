//! wikisync - keep remote wiki pages in a local filesystem cache
//!
//! This crate provides the core functionality for the `wikisync` CLI tool:
//! downloading and uploading a remote wiki page's body and attachments,
//! with hash-based change detection, proactive version-conflict checks,
//! and a reversible pretty-printing transform on the page markup.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Persisted metadata records (`PageMeta`, `AttachmentMeta`)
//! - [`format`] - Reversible expand/collapse of storage-format markup
//! - [`remote`] - Remote wiki client (trait + HTTP implementation)
//! - [`sync`] - Cache layout, hashing, event logs, and the sync manager
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod remote;
pub mod sync;

pub use error::{Error, Result};
