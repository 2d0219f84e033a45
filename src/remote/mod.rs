//! Remote wiki client.
//!
//! Defines the capability the sync manager consumes: [`RemoteWiki`], a trait
//! over the five remote operations, plus the wire types and the
//! timeout/cancellation directive every call accepts. The production
//! implementation is [`HttpWikiClient`]; tests substitute an in-memory mock.
//!
//! The core never retries: a failed remote call is classified (see
//! [`crate::error::Error`]) and propagated unchanged. Retry/backoff policy,
//! if any, belongs to an outer caller.

mod http;

pub use http::HttpWikiClient;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Default deadline applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout/cancellation directive accepted by every remote call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Hard deadline for the call. Expiry fails with [`Error::TimedOut`].
    pub timeout: Duration,
    /// Optional external cancellation. Triggering fails the call with
    /// [`Error::Cancelled`], distinct from a timeout or a remote error.
    pub cancel: Option<CancelHandle>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }
}

impl CallOptions {
    /// Options with an explicit timeout in seconds and no cancel handle.
    #[must_use]
    pub fn with_timeout_secs(seconds: u64) -> Self {
        Self {
            timeout: Duration::from_secs(seconds),
            cancel: None,
        }
    }
}

/// Cloneable handle used to cancel in-flight remote calls.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Signal cancellation. All clones observe it.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled; pends forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        // Sender gone without a cancel signal: cancellation can no longer
        // happen, so this arm must never win a select.
        std::future::pending::<()>().await;
    }
}

/// Run a remote call future under the directive's deadline and cancel
/// signal.
pub(crate) async fn guard<T, F>(opts: &CallOptions, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let seconds = opts.timeout.as_secs();
    match &opts.cancel {
        Some(cancel) => {
            tokio::select! {
                () = cancel.cancelled() => Err(Error::Cancelled),
                res = tokio::time::timeout(opts.timeout, fut) => match res {
                    Ok(inner) => inner,
                    Err(_) => Err(Error::TimedOut { seconds }),
                },
            }
        }
        None => match tokio::time::timeout(opts.timeout, fut).await {
            Ok(inner) => inner,
            Err(_) => Err(Error::TimedOut { seconds }),
        },
    }
}

/// A page as returned by the remote, body in compact storage format.
#[derive(Debug, Clone)]
pub struct RemotePage {
    pub id: String,
    pub title: String,
    pub version: i64,
    pub body_storage: String,
}

/// One attachment from the remote listing.
#[derive(Debug, Clone)]
pub struct RemoteAttachment {
    pub id: String,
    pub title: String,
    pub version: i64,
    /// Download location, usually relative to the base URL.
    pub download_url: String,
    pub file_size: u64,
    pub media_type: String,
}

/// A body update submitted to the remote.
#[derive(Debug, Clone)]
pub struct PageUpdate {
    /// Title to keep (callers pass the current remote title; the body sync
    /// path does not edit titles).
    pub title: String,
    /// New body in compact storage format.
    pub body_storage: String,
    /// Version the caller believes the remote is at. A concurrent edit
    /// makes the remote reject the write with a version conflict.
    pub expected_version: i64,
}

/// The remote wiki operations the sync manager consumes.
///
/// Implemented by [`HttpWikiClient`] for production and by in-memory mocks
/// in tests. Every method honors the [`CallOptions`] directive.
pub trait RemoteWiki: Send + Sync {
    /// Fetch a page's title, version, and storage-format body.
    fn get_page(
        &self,
        id: &str,
        opts: &CallOptions,
    ) -> impl Future<Output = Result<RemotePage>> + Send;

    /// Submit a new body; returns the new remote version number.
    fn update_page(
        &self,
        id: &str,
        update: PageUpdate,
        opts: &CallOptions,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// List the page's attachments.
    fn list_attachments(
        &self,
        id: &str,
        opts: &CallOptions,
    ) -> impl Future<Output = Result<Vec<RemoteAttachment>>> + Send;

    /// Upload attachment bytes. Re-uploading an existing filename creates a
    /// new version of the same logical attachment.
    fn upload_attachment(
        &self,
        id: &str,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
        opts: &CallOptions,
    ) -> impl Future<Output = Result<RemoteAttachment>> + Send;

    /// Download one attachment's bytes.
    fn download_attachment(
        &self,
        id: &str,
        attachment: &RemoteAttachment,
        opts: &CallOptions,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_through_success() {
        let opts = CallOptions::default();
        let out: Result<u32> = guard(&opts, async { Ok(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_guard_times_out() {
        let opts = CallOptions {
            timeout: Duration::from_millis(10),
            cancel: None,
        };
        let out: Result<u32> = guard(&opts, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;
        assert!(matches!(out, Err(Error::TimedOut { .. })));
    }

    #[tokio::test]
    async fn test_guard_cancels_distinctly() {
        let cancel = CancelHandle::new();
        let opts = CallOptions {
            timeout: Duration::from_secs(30),
            cancel: Some(cancel.clone()),
        };
        cancel.cancel();
        let out: Result<u32> = guard(&opts, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_handle_clones_share_state() {
        let a = CancelHandle::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
