//! Page metadata record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AttachmentMeta;

/// Sync metadata for one remote page, persisted as `meta.json`.
///
/// The record tracks what the cache believes about both sides: the remote
/// revision number observed at the last successful read or write, and the
/// hash of the *expanded* body text currently on disk. Hashing the expanded
/// form (never the compact remote form) keeps change detection symmetric
/// between the download and upload paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Stable remote identifier.
    pub document_id: String,

    /// Page title as last seen on the remote.
    pub title: String,

    /// Remote revision number at the last successful sync.
    ///
    /// Any divergence observed before a write is a conflict, never
    /// silently resolved.
    pub version: i64,

    /// When the body was last downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,

    /// When the body was last uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_uploaded_at: Option<DateTime<Utc>>,

    /// When attachments were last scanned against the remote listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attachment_scan_at: Option<DateTime<Utc>>,

    /// SHA256 hex digest of the expanded body text on disk.
    pub body_content_hash: String,

    /// Tracked attachments, keyed by title (the natural key).
    ///
    /// Keying by title makes upsert a single map operation and guarantees
    /// at most one entry per title. Remote ids are not used as keys because
    /// they are not stable across an attachment's version history.
    #[serde(default)]
    pub attachments: BTreeMap<String, AttachmentMeta>,
}

impl PageMeta {
    /// Create a fresh record for a page seen for the first time.
    #[must_use]
    pub fn new(document_id: String, title: String, version: i64, body_content_hash: String) -> Self {
        Self {
            document_id,
            title,
            version,
            downloaded_at: None,
            last_uploaded_at: None,
            last_attachment_scan_at: None,
            body_content_hash,
            attachments: BTreeMap::new(),
        }
    }

    /// Insert or replace the attachment entry with the same title.
    pub fn upsert_attachment(&mut self, meta: AttachmentMeta) {
        self.attachments.insert(meta.title.clone(), meta);
    }

    /// Remove the attachment entry for `title`, returning it if present.
    pub fn remove_attachment(&mut self, title: &str) -> Option<AttachmentMeta> {
        self.attachments.remove(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attachment(title: &str, version: i64) -> AttachmentMeta {
        AttachmentMeta {
            id: format!("att-{title}"),
            title: title.to_string(),
            version,
            content_hash: "deadbeef".to_string(),
            media_type: "image/png".to_string(),
            file_size: 512,
            downloaded_at: None,
            last_uploaded_at: None,
        }
    }

    #[test]
    fn test_upsert_replaces_by_title() {
        let mut meta = PageMeta::new("123".into(), "Home".into(), 1, "hash".into());

        meta.upsert_attachment(sample_attachment("diagram.png", 1));
        meta.upsert_attachment(sample_attachment("diagram.png", 2));

        assert_eq!(meta.attachments.len(), 1);
        assert_eq!(meta.attachments["diagram.png"].version, 2);
    }

    #[test]
    fn test_serializes_camel_case_with_map() {
        let mut meta = PageMeta::new("123".into(), "Home".into(), 3, "abc".into());
        meta.upsert_attachment(sample_attachment("a.png", 1));

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["documentId"], "123");
        assert_eq!(json["bodyContentHash"], "abc");
        assert!(json["attachments"]["a.png"].is_object());
        // Absent timestamps are omitted, not null.
        assert!(json.get("downloadedAt").is_none());
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut meta = PageMeta::new("x/y".into(), "T".into(), 7, "h".into());
        meta.downloaded_at = Some(Utc::now());
        meta.upsert_attachment(sample_attachment("z.bin", 4));

        let text = serde_json::to_string_pretty(&meta).unwrap();
        let back: PageMeta = serde_json::from_str(&text).unwrap();
        assert_eq!(back.version, 7);
        assert_eq!(back.attachments["z.bin"].version, 4);
    }
}
