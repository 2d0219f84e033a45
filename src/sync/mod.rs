//! Synchronization engine.
//!
//! This module owns everything between the remote client and the disk:
//!
//! - **Hashing**: SHA256 content addressing for change detection
//! - **Cache**: the per-page directory layout and file primitives
//! - **Log**: per-operation masked JSON event records
//! - **Manager**: the four sync operations with skip/conflict/dedup logic
//!
//! # Change detection
//!
//! The metadata record stores the hash of the *expanded* body text on disk,
//! never the compact remote form. Downloads hash the remote body after
//! expanding it; uploads hash the local file before collapsing it. Both
//! sides therefore compare the same representation, and a round trip with
//! no edits is a guaranteed no-op in both directions.
//!
//! # Failure policy
//!
//! No retries, no partial successes: the first failure aborts the operation
//! and propagates unchanged, wrapped with the path of the event log that
//! recorded it. Metadata is only written after the operation's filesystem
//! work succeeded.

pub mod cache;
pub mod hash;
pub mod log;
pub mod manager;
pub mod types;

pub use cache::{sanitize_segment, PageCache};
pub use hash::{content_hash, has_changed};
pub use log::{mask_sensitive, EventLog, REDACTION_MARKER};
pub use manager::{parse_page_ref, SyncManager};
pub use types::{
    AttachmentDownloadOutcome, AttachmentUploadOutcome, BodyDownloadOutcome, BodyUploadOutcome,
    OpFailure, OpKind,
};
