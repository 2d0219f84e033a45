//! Sync manager: the four operations against the remote wiki.
//!
//! Orchestrates body download/upload and attachment download/upload between
//! the [`RemoteWiki`] client and the local [`PageCache`], implementing the
//! skip/conflict/dedup logic:
//!
//! - Change detection compares SHA256 hashes of the *expanded* body text on
//!   both paths, so a no-op round trip through the formatter never produces
//!   a spurious upload.
//! - The version number recorded at the last sync is the authoritative
//!   conflict signal: uploads check it against the remote before any
//!   mutation and never merge.
//! - Attachments are processed one at a time in listing order; the first
//!   failure aborts the operation, leaving already-written files and the
//!   event log for inspection. Metadata is persisted only after the
//!   operation fully succeeds.
//!
//! Every operation carries an [`OpContext`] (correlation id + event log)
//! created per call; there is no process-wide logging state.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::format;
use crate::model::{AttachmentMeta, PageMeta};
use crate::remote::{CallOptions, PageUpdate, RemoteWiki};
use crate::sync::cache::PageCache;
use crate::sync::hash::content_hash;
use crate::sync::log::{event, EventLog};
use crate::sync::types::{
    AttachmentDownloadOutcome, AttachmentUploadOutcome, BodyDownloadOutcome, BodyUploadOutcome,
    OpFailure, OpKind,
};

/// Resolve a page reference to a stable identifier.
///
/// Accepts a bare id, a URL with a `pageId=` query parameter, or a URL with
/// a `/pages/<id>/` path segment.
pub fn parse_page_ref(reference: &str) -> Result<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Error::InvalidPageRef("empty reference".to_string()));
    }

    if !reference.contains("://") {
        return Ok(reference.to_string());
    }

    if let Some(start) = reference.find("pageId=") {
        let id: String = reference[start + "pageId=".len()..]
            .chars()
            .take_while(|c| *c != '&' && *c != '#')
            .collect();
        if !id.is_empty() {
            return Ok(id);
        }
    }

    if let Some(start) = reference.find("/pages/") {
        let id: String = reference[start + "/pages/".len()..]
            .chars()
            .take_while(|c| *c != '/' && *c != '?' && *c != '#')
            .collect();
        if !id.is_empty() {
            return Ok(id);
        }
    }

    Err(Error::InvalidPageRef(reference.to_string()))
}

/// Per-operation context: correlation id plus the event log sink.
///
/// Passed explicitly through each operation instead of living in global
/// state, so concurrent calls against different pages stay traceable.
struct OpContext {
    kind: OpKind,
    correlation_id: String,
    log: EventLog,
}

impl OpContext {
    fn begin(kind: OpKind, log_dir: &Path, document_id: &str) -> Result<Self> {
        let log = EventLog::create(log_dir, kind.as_str())?;
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let mut started = event("started", kind.as_str(), &correlation_id);
        started["documentId"] = serde_json::Value::String(document_id.to_string());
        log.append(started);
        Ok(Self {
            kind,
            correlation_id,
            log,
        })
    }

    fn log_path(&self) -> PathBuf {
        self.log.path().to_path_buf()
    }

    /// Record successful completion with operation-specific fields.
    fn complete(&self, extra: serde_json::Value) {
        let mut record = event("completed", self.kind.as_str(), &self.correlation_id);
        if let (Some(base), Some(fields)) = (record.as_object_mut(), extra.as_object()) {
            for (key, value) in fields {
                base.insert(key.clone(), value.clone());
            }
        }
        self.log.append(record);
    }

    /// Record failure with the classified error code, so a timeout and a
    /// cancellation stay distinguishable in the log.
    fn fail(&self, error: &Error) {
        let mut record = event("failed", self.kind.as_str(), &self.correlation_id);
        record["error"] = serde_json::Value::String(error.to_string());
        record["code"] = serde_json::Value::String(error.error_code().as_str().to_string());
        self.log.append(record);
    }
}

/// Orchestrates sync operations for pages under one cache root.
pub struct SyncManager<C: RemoteWiki> {
    client: C,
    root: PathBuf,
}

impl<C: RemoteWiki> SyncManager<C> {
    /// Create a manager over `client`, caching under `root`.
    pub fn new(client: C, root: PathBuf) -> Self {
        Self { client, root }
    }

    /// The cache directory handle for a document id.
    #[must_use]
    pub fn cache_for(&self, document_id: &str) -> PageCache {
        PageCache::new(&self.root, document_id)
    }

    // ── Body download ─────────────────────────────────────────

    /// Download the page body into the cache.
    ///
    /// The remote body is expanded before hashing, so the stored hash always
    /// reflects the formatted text on disk. When both the hash and the
    /// version match the record, the write is skipped and only
    /// `downloadedAt` is refreshed; the attachments map is untouched either
    /// way.
    pub async fn download_body(
        &self,
        document_id: &str,
        opts: &CallOptions,
    ) -> std::result::Result<BodyDownloadOutcome, OpFailure> {
        let cache = self.cache_for(document_id);
        let ctx = OpContext::begin(OpKind::DownloadBody, &cache.log_dir(), document_id)?;

        match self.download_body_inner(&cache, document_id, opts, &ctx).await {
            Ok(outcome) => {
                ctx.complete(serde_json::json!({
                    "documentId": document_id,
                    "skipped": outcome.skipped,
                    "version": outcome.version,
                }));
                Ok(outcome)
            }
            Err(error) => {
                ctx.fail(&error);
                Err(OpFailure {
                    error,
                    log_path: Some(ctx.log_path()),
                })
            }
        }
    }

    async fn download_body_inner(
        &self,
        cache: &PageCache,
        document_id: &str,
        opts: &CallOptions,
        ctx: &OpContext,
    ) -> Result<BodyDownloadOutcome> {
        let page = self.client.get_page(document_id, opts).await?;
        let expanded = format::expand(&page.body_storage);
        let hash = content_hash(expanded.as_bytes());
        let now = Utc::now();

        if let Some(mut meta) = cache.read_meta()? {
            let unchanged = meta.version == page.version
                && meta.body_content_hash == hash
                && cache.body_path().exists();
            if unchanged {
                tracing::debug!(document_id, version = page.version, "body unchanged, skipping write");
                meta.downloaded_at = Some(now);
                cache.write_meta(&meta)?;
                return Ok(BodyDownloadOutcome {
                    skipped: true,
                    version: page.version,
                    body_path: cache.body_path(),
                    meta_path: cache.meta_path(),
                    log_path: ctx.log_path(),
                });
            }

            // Body first, metadata only after the write succeeded.
            cache.write_body(&expanded)?;
            meta.title = page.title;
            meta.version = page.version;
            meta.body_content_hash = hash;
            meta.downloaded_at = Some(now);
            cache.write_meta(&meta)?;
        } else {
            cache.write_body(&expanded)?;
            let mut meta = PageMeta::new(
                document_id.to_string(),
                page.title,
                page.version,
                hash,
            );
            meta.downloaded_at = Some(now);
            cache.write_meta(&meta)?;
        }

        tracing::info!(document_id, version = page.version, "body downloaded");
        Ok(BodyDownloadOutcome {
            skipped: false,
            version: page.version,
            body_path: cache.body_path(),
            meta_path: cache.meta_path(),
            log_path: ctx.log_path(),
        })
    }

    // ── Body upload ───────────────────────────────────────────

    /// Upload the locally edited body back to the remote.
    ///
    /// Fails with distinct errors when the metadata record or the body file
    /// is missing. The recorded version is checked against the remote
    /// before any mutation; divergence is a conflict, never merged. A body
    /// whose formatted hash matches the record skips the remote write
    /// entirely.
    pub async fn upload_body(
        &self,
        document_id: &str,
        opts: &CallOptions,
    ) -> std::result::Result<BodyUploadOutcome, OpFailure> {
        let cache = self.cache_for(document_id);
        let ctx = OpContext::begin(OpKind::UploadBody, &cache.log_dir(), document_id)?;

        match self.upload_body_inner(&cache, document_id, opts, &ctx).await {
            Ok(outcome) => {
                ctx.complete(serde_json::json!({
                    "documentId": document_id,
                    "pageUpdated": outcome.page_updated,
                    "version": outcome.version,
                }));
                Ok(outcome)
            }
            Err(error) => {
                ctx.fail(&error);
                Err(OpFailure {
                    error,
                    log_path: Some(ctx.log_path()),
                })
            }
        }
    }

    async fn upload_body_inner(
        &self,
        cache: &PageCache,
        document_id: &str,
        opts: &CallOptions,
        ctx: &OpContext,
    ) -> Result<BodyUploadOutcome> {
        let mut meta = cache.require_meta()?;
        let body = cache.read_body()?;

        let remote = self.client.get_page(document_id, opts).await?;
        if remote.version != meta.version {
            return Err(Error::RemoteVersionConflict {
                local: meta.version,
                remote: Some(remote.version),
            });
        }

        let hash = content_hash(body.as_bytes());
        if hash == meta.body_content_hash {
            tracing::debug!(document_id, "body hash unchanged, skipping remote write");
            cache.write_meta(&meta)?;
            return Ok(BodyUploadOutcome {
                page_updated: false,
                version: meta.version,
                log_path: ctx.log_path(),
            });
        }

        let update = PageUpdate {
            // Titles are not editable through this path; keep the remote's.
            title: remote.title.clone(),
            body_storage: format::collapse(&body),
            expected_version: meta.version,
        };
        let new_version = self.client.update_page(document_id, update, opts).await?;

        meta.title = remote.title;
        meta.version = new_version;
        meta.body_content_hash = hash;
        meta.last_uploaded_at = Some(Utc::now());
        cache.write_meta(&meta)?;

        tracing::info!(document_id, version = new_version, "body uploaded");
        Ok(BodyUploadOutcome {
            page_updated: true,
            version: new_version,
            log_path: ctx.log_path(),
        })
    }

    // ── Attachment download ───────────────────────────────────

    /// Download attachments, optionally restricted to `filter` titles.
    ///
    /// An unfiltered scan is authoritative: tracked attachments missing from
    /// the remote listing are deleted locally. A filtered scan only examined
    /// a subset and must not delete anything.
    pub async fn download_attachments(
        &self,
        document_id: &str,
        filter: Option<&BTreeSet<String>>,
        opts: &CallOptions,
    ) -> std::result::Result<AttachmentDownloadOutcome, OpFailure> {
        let cache = self.cache_for(document_id);
        let ctx = OpContext::begin(OpKind::DownloadAttachments, &cache.log_dir(), document_id)?;

        match self
            .download_attachments_inner(&cache, document_id, filter, opts, &ctx)
            .await
        {
            Ok(outcome) => {
                ctx.complete(serde_json::json!({
                    "documentId": document_id,
                    "downloaded": outcome.downloaded.clone(),
                    "skipped": outcome.skipped.clone(),
                    "removed": outcome.removed.clone(),
                }));
                Ok(outcome)
            }
            Err(error) => {
                ctx.fail(&error);
                Err(OpFailure {
                    error,
                    log_path: Some(ctx.log_path()),
                })
            }
        }
    }

    async fn download_attachments_inner(
        &self,
        cache: &PageCache,
        document_id: &str,
        filter: Option<&BTreeSet<String>>,
        opts: &CallOptions,
        ctx: &OpContext,
    ) -> Result<AttachmentDownloadOutcome> {
        // First contact with this page may be through its attachments; seed
        // the record from the remote so there is something to track into.
        let mut meta = match cache.read_meta()? {
            Some(meta) => meta,
            None => {
                let page = self.client.get_page(document_id, opts).await?;
                PageMeta::new(document_id.to_string(), page.title, page.version, String::new())
            }
        };

        let listing = self.client.list_attachments(document_id, opts).await?;
        let mut downloaded = Vec::new();
        let mut skipped = Vec::new();

        for remote in listing
            .iter()
            .filter(|a| filter.is_none_or(|set| set.contains(&a.title)))
        {
            let previous = meta.attachments.get(&remote.title).cloned();
            let file_present = cache.attachment_path(&remote.title).exists();

            if let Some(prev) = &previous {
                if prev.version == remote.version && file_present {
                    skipped.push(remote.title.clone());
                    continue;
                }
            }

            // A single failed transfer aborts the whole operation; files
            // already written stay on disk for inspection.
            let bytes = self.client.download_attachment(document_id, remote, opts).await?;
            cache.write_attachment(&remote.title, &bytes)?;

            meta.upsert_attachment(AttachmentMeta {
                id: remote.id.clone(),
                title: remote.title.clone(),
                version: remote.version,
                content_hash: content_hash(&bytes),
                media_type: remote.media_type.clone(),
                file_size: bytes.len() as u64,
                downloaded_at: Some(Utc::now()),
                last_uploaded_at: previous.and_then(|p| p.last_uploaded_at),
            });
            downloaded.push(remote.title.clone());
        }

        let mut removed = Vec::new();
        if filter.is_none() {
            let remote_titles: BTreeSet<&str> =
                listing.iter().map(|a| a.title.as_str()).collect();
            let stale: Vec<String> = meta
                .attachments
                .keys()
                .filter(|title| !remote_titles.contains(title.as_str()))
                .cloned()
                .collect();
            for title in stale {
                cache.remove_attachment_file(&title)?;
                meta.remove_attachment(&title);
                tracing::info!(document_id, title = %title, "attachment removed remotely, deleted locally");
                removed.push(title);
            }
        }

        meta.last_attachment_scan_at = Some(Utc::now());
        cache.write_meta(&meta)?;

        Ok(AttachmentDownloadOutcome {
            downloaded,
            skipped,
            removed,
            log_path: ctx.log_path(),
        })
    }

    // ── Attachment upload ─────────────────────────────────────

    /// Upload locally changed attachments, optionally restricted to
    /// `filter` titles.
    ///
    /// Only attachments already tracked in the metadata are considered;
    /// upload never discovers untracked files. A tracked attachment whose
    /// file is missing is a hard error, never a silent skip.
    pub async fn upload_attachments(
        &self,
        document_id: &str,
        filter: Option<&BTreeSet<String>>,
        opts: &CallOptions,
    ) -> std::result::Result<AttachmentUploadOutcome, OpFailure> {
        let cache = self.cache_for(document_id);
        let ctx = OpContext::begin(OpKind::UploadAttachments, &cache.log_dir(), document_id)?;

        match self
            .upload_attachments_inner(&cache, document_id, filter, opts, &ctx)
            .await
        {
            Ok(outcome) => {
                ctx.complete(serde_json::json!({
                    "documentId": document_id,
                    "uploaded": outcome.uploaded.clone(),
                    "skipped": outcome.skipped.clone(),
                }));
                Ok(outcome)
            }
            Err(error) => {
                ctx.fail(&error);
                Err(OpFailure {
                    error,
                    log_path: Some(ctx.log_path()),
                })
            }
        }
    }

    async fn upload_attachments_inner(
        &self,
        cache: &PageCache,
        document_id: &str,
        filter: Option<&BTreeSet<String>>,
        opts: &CallOptions,
        ctx: &OpContext,
    ) -> Result<AttachmentUploadOutcome> {
        let mut meta = cache.require_meta()?;

        let titles: Vec<String> = meta
            .attachments
            .keys()
            .filter(|title| filter.is_none_or(|set| set.contains(*title)))
            .cloned()
            .collect();

        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();

        for title in titles {
            let Some(entry) = meta.attachments.get(&title).cloned() else {
                continue;
            };
            let bytes = cache.read_attachment(&title)?;
            let hash = content_hash(&bytes);

            if hash == entry.content_hash {
                skipped.push(title);
                continue;
            }

            let remote = self
                .client
                .upload_attachment(document_id, &title, bytes, &entry.media_type, opts)
                .await?;

            meta.upsert_attachment(AttachmentMeta {
                id: remote.id,
                title: title.clone(),
                version: remote.version,
                content_hash: hash,
                media_type: remote.media_type,
                file_size: remote.file_size,
                downloaded_at: entry.downloaded_at,
                last_uploaded_at: Some(Utc::now()),
            });
            tracing::info!(document_id, title = %title, "attachment uploaded");
            uploaded.push(title);
        }

        cache.write_meta(&meta)?;

        Ok(AttachmentUploadOutcome {
            uploaded,
            skipped,
            log_path: ctx.log_path(),
        })
    }
}
