//! Attachment metadata record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync metadata for one attachment of a page.
///
/// Attachments are opaque binary, so `content_hash` is computed over the raw
/// bytes on disk (unlike the page body, which is hashed in its expanded
/// form). Entries live inside [`super::PageMeta::attachments`], keyed by
/// `title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    /// Remote attachment identifier. May change across versions; `title`
    /// is the stable key.
    pub id: String,

    /// Filename, unique within the page's attachment set.
    pub title: String,

    /// Remote revision number of the attachment.
    pub version: i64,

    /// SHA256 hex digest of the attachment bytes.
    pub content_hash: String,

    /// MIME type reported by the remote.
    pub media_type: String,

    /// Size in bytes.
    pub file_size: u64,

    /// When the attachment was last downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<DateTime<Utc>>,

    /// When the attachment was last uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_uploaded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_fields() {
        let meta = AttachmentMeta {
            id: "1001".into(),
            title: "chart.png".into(),
            version: 2,
            content_hash: "ffee".into(),
            media_type: "image/png".into(),
            file_size: 2048,
            downloaded_at: None,
            last_uploaded_at: None,
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["contentHash"], "ffee");
        assert_eq!(json["mediaType"], "image/png");
        assert_eq!(json["fileSize"], 2048);
    }
}
