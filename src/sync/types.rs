//! Operation kinds and outcome types for sync operations.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Error;

/// The four sync operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    DownloadBody,
    UploadBody,
    DownloadAttachments,
    UploadAttachments,
}

impl OpKind {
    /// Kebab-case name used in log file names and event records.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::DownloadBody => "download-body",
            Self::UploadBody => "upload-body",
            Self::DownloadAttachments => "download-attachments",
            Self::UploadAttachments => "upload-attachments",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a body download.
#[derive(Debug, Clone, Serialize)]
pub struct BodyDownloadOutcome {
    /// True when the remote body and version matched the cache and nothing
    /// was written.
    pub skipped: bool,
    /// Remote version after the operation.
    pub version: i64,
    /// Where the expanded body lives.
    pub body_path: PathBuf,
    /// Where the metadata record lives.
    pub meta_path: PathBuf,
    /// Event log recording this operation.
    pub log_path: PathBuf,
}

/// Result of a body upload.
#[derive(Debug, Clone, Serialize)]
pub struct BodyUploadOutcome {
    /// True when the remote page was actually rewritten. False means the
    /// local body hash matched the record and no remote mutation happened.
    pub page_updated: bool,
    /// Remote version after the operation.
    pub version: i64,
    /// Event log recording this operation.
    pub log_path: PathBuf,
}

/// Result of an attachment download.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentDownloadOutcome {
    /// Titles downloaded this run.
    pub downloaded: Vec<String>,
    /// Titles skipped because version and local file both matched.
    pub skipped: Vec<String>,
    /// Titles garbage-collected because the remote listing no longer has
    /// them. Always empty on filtered scans.
    pub removed: Vec<String>,
    /// Event log recording this operation.
    pub log_path: PathBuf,
}

/// Result of an attachment upload.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentUploadOutcome {
    /// Titles uploaded this run.
    pub uploaded: Vec<String>,
    /// Titles skipped because the local bytes hash matched the record.
    pub skipped: Vec<String>,
    /// Event log recording this operation.
    pub log_path: PathBuf,
}

/// A failed sync operation, paired with the log file that recorded it.
///
/// The inner error is the classified failure, propagated unchanged; the log
/// path points at the forensic record of the attempt.
#[derive(Debug)]
pub struct OpFailure {
    pub error: Error,
    pub log_path: Option<PathBuf>,
}

impl std::fmt::Display for OpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.log_path {
            Some(path) => write!(f, "{} (log: {})", self.error, path.display()),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OpFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<Error> for OpFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            log_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_kind_names() {
        assert_eq!(OpKind::DownloadBody.as_str(), "download-body");
        assert_eq!(OpKind::UploadAttachments.as_str(), "upload-attachments");
    }

    #[test]
    fn test_failure_display_includes_log_path() {
        let failure = OpFailure {
            error: Error::Cancelled,
            log_path: Some(PathBuf::from("/c/log/download-body-x.log")),
        };
        let text = failure.to_string();
        assert!(text.contains("cancelled"));
        assert!(text.contains("download-body-x.log"));
    }
}
