//! Local cache layout and file primitives.
//!
//! One directory per synced page under the cache root:
//!
//! ```text
//! <root>/<sanitized-id>/page-body.xhtml    expanded storage-format text
//! <root>/<sanitized-id>/meta.json          PageMeta, pretty-printed, trailing newline
//! <root>/<sanitized-id>/attachments/<t>    raw attachment bytes, one file per title
//! <root>/log/<operation>-<timestamp>.log   newline-delimited masked JSON events
//! ```
//!
//! Metadata is replaced wholesale on every write: temp file, fsync, rename.
//! There is no partial-write recovery; an interrupted write means "metadata
//! may be stale, re-run sync".

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::PageMeta;

/// Substitute for characters that are illegal in path segments.
const PATH_SUBSTITUTE: char = '_';

/// File name of the expanded body text.
pub const BODY_FILE: &str = "page-body.xhtml";

/// File name of the metadata record.
pub const META_FILE: &str = "meta.json";

/// Make an identifier or attachment title safe as a single path segment.
#[must_use]
pub fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => PATH_SUBSTITUTE,
            c if c.is_control() => PATH_SUBSTITUTE,
            c => c,
        })
        .collect()
}

/// Write content to a file atomically.
///
/// Writes to a temporary sibling, fsyncs, then renames over the target. If
/// any step fails the original file (if any) remains untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// The on-disk cache directory for one page.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
    dir: PathBuf,
}

impl PageCache {
    /// Resolve the cache directory for a document id under `root`.
    #[must_use]
    pub fn new(root: &Path, document_id: &str) -> Self {
        let dir = root.join(sanitize_segment(document_id));
        Self {
            root: root.to_path_buf(),
            dir,
        }
    }

    /// The cache root this page lives under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The page's own directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the expanded body text.
    #[must_use]
    pub fn body_path(&self) -> PathBuf {
        self.dir.join(BODY_FILE)
    }

    /// Path of the metadata record.
    #[must_use]
    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Directory holding raw attachment bytes.
    #[must_use]
    pub fn attachments_dir(&self) -> PathBuf {
        self.dir.join("attachments")
    }

    /// Path for one attachment, by title.
    #[must_use]
    pub fn attachment_path(&self, title: &str) -> PathBuf {
        self.attachments_dir().join(sanitize_segment(title))
    }

    /// Directory for per-operation event logs, shared across pages.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    // ── Metadata ──────────────────────────────────────────────

    /// Read the metadata record, or `None` if the page was never synced.
    pub fn read_meta(&self) -> Result<Option<PageMeta>> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Read the metadata record, failing if it does not exist.
    pub fn require_meta(&self) -> Result<PageMeta> {
        self.read_meta()?.ok_or_else(|| Error::MetadataMissing {
            path: self.meta_path(),
        })
    }

    /// Replace the metadata record atomically.
    ///
    /// Pretty-printed with a trailing newline so the file diffs cleanly.
    pub fn write_meta(&self, meta: &PageMeta) -> Result<()> {
        let mut text = serde_json::to_string_pretty(meta)?;
        text.push('\n');
        atomic_write(&self.meta_path(), text.as_bytes())
    }

    // ── Body ──────────────────────────────────────────────────

    /// Read the expanded body text, failing if the file is missing.
    pub fn read_body(&self) -> Result<String> {
        let path = self.body_path();
        if !path.exists() {
            return Err(Error::BodyFileMissing { path });
        }
        Ok(fs::read_to_string(&path)?)
    }

    /// Write the expanded body text.
    pub fn write_body(&self, text: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.body_path(), text)?;
        Ok(())
    }

    // ── Attachments ───────────────────────────────────────────

    /// Read one attachment's bytes, failing if the file is missing.
    pub fn read_attachment(&self, title: &str) -> Result<Vec<u8>> {
        let path = self.attachment_path(title);
        if !path.exists() {
            return Err(Error::AttachmentFileMissing { path });
        }
        Ok(fs::read(&path)?)
    }

    /// Write one attachment's bytes, returning the path written.
    pub fn write_attachment(&self, title: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.attachment_path(title);
        fs::create_dir_all(self.attachments_dir())?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Delete one attachment file; already-absent files are fine.
    pub fn remove_attachment_file(&self, title: &str) -> Result<()> {
        let path = self.attachment_path(title);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
