//! Error types for wikisync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=local_state, 5=conflict, etc.)
//! - Retryability flags for agent self-correction
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wikisync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Agents match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Config (exit 2)
    ConfigError,

    // Local cache state (exit 3)
    MetadataMissing,
    BodyFileMissing,
    AttachmentFileMissing,

    // Validation (exit 4)
    InvalidPageRef,
    InvalidArgument,

    // Conflict (exit 5)
    RemoteVersionConflict,

    // Remote (exit 6)
    RemoteNotFound,
    RemoteAuthFailed,
    RemotePermissionDenied,
    RemoteRateLimited,
    RemoteServiceError,
    RemoteUnknown,

    // Timeout / cancellation (exit 7)
    TimedOut,
    Cancelled,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::MetadataMissing => "METADATA_MISSING",
            Self::BodyFileMissing => "BODY_FILE_MISSING",
            Self::AttachmentFileMissing => "ATTACHMENT_FILE_MISSING",
            Self::InvalidPageRef => "INVALID_PAGE_REF",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RemoteVersionConflict => "REMOTE_VERSION_CONFLICT",
            Self::RemoteNotFound => "REMOTE_NOT_FOUND",
            Self::RemoteAuthFailed => "REMOTE_AUTH_FAILED",
            Self::RemotePermissionDenied => "REMOTE_PERMISSION_DENIED",
            Self::RemoteRateLimited => "REMOTE_RATE_LIMITED",
            Self::RemoteServiceError => "REMOTE_SERVICE_ERROR",
            Self::RemoteUnknown => "REMOTE_UNKNOWN",
            Self::TimedOut => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::ConfigError => 2,
            Self::MetadataMissing | Self::BodyFileMissing | Self::AttachmentFileMissing => 3,
            Self::InvalidPageRef | Self::InvalidArgument => 4,
            Self::RemoteVersionConflict => 5,
            Self::RemoteNotFound
            | Self::RemoteAuthFailed
            | Self::RemotePermissionDenied
            | Self::RemoteRateLimited
            | Self::RemoteServiceError
            | Self::RemoteUnknown => 6,
            Self::TimedOut | Self::Cancelled => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether an agent should retry the same call.
    ///
    /// True for a version conflict (re-download then retry), rate limiting,
    /// transient service failures, and timeouts. False for auth, permission,
    /// not-found, and local-state errors, which need human intervention.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteVersionConflict
                | Self::RemoteRateLimited
                | Self::RemoteServiceError
                | Self::TimedOut
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in wikisync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Remote page not found: {id}")]
    RemoteNotFound { id: String, status: u16 },

    #[error("Remote authentication failed (status {status})")]
    RemoteAuthFailed { status: u16 },

    #[error("Remote permission denied (status {status})")]
    RemotePermissionDenied { status: u16 },

    #[error("Remote rate limited (status {status})")]
    RemoteRateLimited { status: u16 },

    #[error("Remote service error (status {status})")]
    RemoteServiceError { status: u16 },

    #[error(
        "Version conflict: local metadata has version {local}, remote {}",
        remote.map_or_else(|| "has advanced".to_string(), |v| format!("is at {v}"))
    )]
    RemoteVersionConflict { local: i64, remote: Option<i64> },

    #[error("Unexpected remote failure (status {status}): {message}")]
    RemoteUnknown { status: u16, message: String },

    #[error("No local metadata for page: {}", path.display())]
    MetadataMissing { path: PathBuf },

    #[error("No local body file for page: {}", path.display())]
    BodyFileMissing { path: PathBuf },

    #[error("Tracked attachment file missing locally: {}", path.display())]
    AttachmentFileMissing { path: PathBuf },

    #[error("Remote call timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("Remote call cancelled")]
    Cancelled,

    #[error("Invalid page reference: {0}")]
    InvalidPageRef(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::RemoteNotFound { .. } => ErrorCode::RemoteNotFound,
            Self::RemoteAuthFailed { .. } => ErrorCode::RemoteAuthFailed,
            Self::RemotePermissionDenied { .. } => ErrorCode::RemotePermissionDenied,
            Self::RemoteRateLimited { .. } => ErrorCode::RemoteRateLimited,
            Self::RemoteServiceError { .. } => ErrorCode::RemoteServiceError,
            Self::RemoteVersionConflict { .. } => ErrorCode::RemoteVersionConflict,
            Self::RemoteUnknown { .. } | Self::Http(_) => ErrorCode::RemoteUnknown,
            Self::MetadataMissing { .. } => ErrorCode::MetadataMissing,
            Self::BodyFileMissing { .. } => ErrorCode::BodyFileMissing,
            Self::AttachmentFileMissing { .. } => ErrorCode::AttachmentFileMissing,
            Self::TimedOut { .. } => ErrorCode::TimedOut,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::InvalidPageRef(_) => ErrorCode::InvalidPageRef,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for agents and humans.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::RemoteVersionConflict { local, .. } => Some(format!(
                "The page was edited remotely since version {local} was synced.\n  \
                 Re-download first: wikisync page download <ref>\n  \
                 Then re-apply your edits and upload again."
            )),

            Self::MetadataMissing { .. } => Some(
                "This page has never been downloaded into the cache.\n  \
                 Download it first: wikisync page download <ref>"
                    .to_string(),
            ),

            Self::BodyFileMissing { path } => Some(format!(
                "The metadata record exists but the body file is gone.\n  \
                 Restore it or re-download: wikisync page download <ref>\n  \
                 Expected at: {}",
                path.display()
            )),

            Self::AttachmentFileMissing { path } => Some(format!(
                "A tracked attachment is missing from the cache: {}\n  \
                 Re-download attachments: wikisync attachments download <ref>",
                path.display()
            )),

            Self::RemoteAuthFailed { .. } => {
                Some("Check WIKISYNC_TOKEN (expired or malformed token?)".to_string())
            }

            Self::RemoteRateLimited { .. } => {
                Some("The remote API is throttling; wait and retry.".to_string())
            }

            Self::Config(msg) if msg.contains("base URL") => {
                Some("Set WIKISYNC_BASE_URL or pass --base-url".to_string())
            }

            Self::InvalidPageRef(_) => Some(
                "Pass a bare page id, a URL containing pageId=<id>, \
                 or a /pages/<id>/ URL"
                    .to_string(),
            ),

            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint. Agents parse this instead of stderr text.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(ErrorCode::ConfigError.exit_code(), 2);
        assert_eq!(ErrorCode::MetadataMissing.exit_code(), 3);
        assert_eq!(ErrorCode::RemoteVersionConflict.exit_code(), 5);
        assert_eq!(ErrorCode::RemoteNotFound.exit_code(), 6);
        assert_eq!(ErrorCode::TimedOut.exit_code(), 7);
        assert_eq!(ErrorCode::IoError.exit_code(), 8);
    }

    #[test]
    fn test_conflict_is_retryable_after_redownload() {
        assert!(ErrorCode::RemoteVersionConflict.is_retryable());
        assert!(!ErrorCode::RemoteAuthFailed.is_retryable());
        assert!(!ErrorCode::MetadataMissing.is_retryable());
    }

    #[test]
    fn test_structured_json_includes_code_and_hint() {
        let err = Error::RemoteVersionConflict {
            local: 3,
            remote: Some(4),
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "REMOTE_VERSION_CONFLICT");
        assert_eq!(json["error"]["exit_code"], 5);
        assert!(
            json["error"]["hint"]
                .as_str()
                .unwrap()
                .contains("Re-download")
        );
    }

    #[test]
    fn test_timeout_distinct_from_cancel() {
        let timeout = Error::TimedOut { seconds: 30 };
        let cancel = Error::Cancelled;
        assert_ne!(timeout.error_code(), cancel.error_code());
        assert_eq!(timeout.exit_code(), cancel.exit_code());
    }
}
