//! Per-operation structured event log.
//!
//! Every sync operation appends newline-delimited JSON events (`started`,
//! then `completed` or `failed`) to its own file under `<root>/log/`,
//! independent of the tracing-based application logger. The files are the
//! forensic record: a failed run can be diagnosed offline without re-running
//! at higher verbosity.
//!
//! Records are masked before writing: any field whose key contains a
//! credential-like substring has its value replaced wholesale.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::error::Result;

/// Fixed marker written in place of masked values.
pub const REDACTION_MARKER: &str = "***";

/// Key substrings that mark a field as sensitive (case-insensitive).
const SENSITIVE_KEY_PARTS: &[&str] = &[
    "token",
    "password",
    "email",
    "secret",
    "authorization",
    "apikey",
    "api_key",
];

/// Recursively mask sensitive fields in place.
///
/// A key match replaces the entire value, whatever its shape; other objects
/// and arrays are descended into.
pub fn mask_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                let lowered = key.to_lowercase();
                if SENSITIVE_KEY_PARTS.iter().any(|part| lowered.contains(part)) {
                    *entry = Value::String(REDACTION_MARKER.to_string());
                } else {
                    mask_sensitive(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                mask_sensitive(item);
            }
        }
        _ => {}
    }
}

/// Append-only event log for one sync operation.
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Create a log file named `<operation>-<timestamp>.log` under
    /// `log_dir`, creating the directory if needed.
    pub fn create(log_dir: &Path, operation: &str) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let path = log_dir.join(format!("{operation}-{timestamp}.log"));
        Ok(Self { path })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mask and append one event record.
    ///
    /// The write completes before this returns, but a write failure does not
    /// fail the sync operation itself; it is reported through tracing.
    pub fn append(&self, mut record: Value) {
        mask_sensitive(&mut record);
        if let Err(e) = self.try_append(&record) {
            tracing::warn!(path = %self.path.display(), error = %e, "event log write failed");
        }
    }

    fn try_append(&self, record: &Value) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        file.sync_all()?;
        Ok(())
    }
}

/// Stamp shared event fields onto a record.
#[must_use]
pub fn event(kind: &str, operation: &str, correlation_id: &str) -> Value {
    serde_json::json!({
        "event": kind,
        "operation": operation,
        "correlationId": correlation_id,
        "at": Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mask_sensitive_by_key_substring() {
        let mut value = serde_json::json!({
            "apiToken": "abc123",
            "userEmail": "user@example.com",
            "PASSWORD": "hunter2",
            "documentId": "42",
            "nested": { "authorizationHeader": "Bearer x", "title": "Home" },
            "list": [{ "api_key": "k" }],
        });
        mask_sensitive(&mut value);

        assert_eq!(value["apiToken"], REDACTION_MARKER);
        assert_eq!(value["userEmail"], REDACTION_MARKER);
        assert_eq!(value["PASSWORD"], REDACTION_MARKER);
        assert_eq!(value["documentId"], "42");
        assert_eq!(value["nested"]["authorizationHeader"], REDACTION_MARKER);
        assert_eq!(value["nested"]["title"], "Home");
        assert_eq!(value["list"][0]["api_key"], REDACTION_MARKER);
    }

    #[test]
    fn test_mask_replaces_structured_values_wholesale() {
        let mut value = serde_json::json!({
            "credentials": { "token": "x" },
            "tokenDetails": { "inner": "y" },
        });
        mask_sensitive(&mut value);
        // "tokenDetails" matches on the key, so the whole object goes.
        assert_eq!(value["tokenDetails"], REDACTION_MARKER);
        // "credentials" does not match, but its inner token does.
        assert_eq!(value["credentials"]["token"], REDACTION_MARKER);
    }

    #[test]
    fn test_append_writes_masked_json_lines() {
        let dir = tempdir().unwrap();
        let log = EventLog::create(dir.path(), "download-body").unwrap();

        log.append(serde_json::json!({"event": "started", "token": "secret"}));
        log.append(serde_json::json!({"event": "completed", "skipped": false}));

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["token"], REDACTION_MARKER);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["skipped"], false);
    }

    #[test]
    fn test_file_name_carries_operation_kind() {
        let dir = tempdir().unwrap();
        let log = EventLog::create(dir.path(), "upload-attachments").unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("upload-attachments-"));
        assert!(name.ends_with(".log"));
    }
}
