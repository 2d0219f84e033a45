//! HTTP implementation of the remote wiki client.
//!
//! Talks to a Confluence-style REST API with bearer-token auth. Every
//! response status is classified into the error taxonomy before the body is
//! interpreted, so callers always see a typed failure carrying the
//! originating status code.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{guard, CallOptions, PageUpdate, RemoteAttachment, RemotePage, RemoteWiki};
use crate::error::{Error, Result};

/// Page size used when walking the attachment listing.
const ATTACHMENT_PAGE_LIMIT: usize = 200;

/// Remote wiki client over HTTP.
pub struct HttpWikiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpWikiClient {
    /// Create a client for the given base URL and API token.
    #[must_use]
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Resolve a listing's download URL, which is usually relative.
    fn download_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.api_url(url)
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Map a non-success status to a typed error.
    ///
    /// `local_version` is set on update calls so a 409 can report which
    /// version the caller expected.
    fn classify(status: StatusCode, id: &str, local_version: Option<i64>, body: String) -> Error {
        match status.as_u16() {
            401 => Error::RemoteAuthFailed { status: 401 },
            403 => Error::RemotePermissionDenied { status: 403 },
            404 => Error::RemoteNotFound {
                id: id.to_string(),
                status: 404,
            },
            409 => Error::RemoteVersionConflict {
                local: local_version.unwrap_or(-1),
                remote: None,
            },
            429 => Error::RemoteRateLimited { status: 429 },
            s if (500..=599).contains(&s) => Error::RemoteServiceError { status: s },
            s => Error::RemoteUnknown {
                status: s,
                message: body,
            },
        }
    }

    /// Fail unless the response is a success, consuming it into an error.
    async fn check(
        response: reqwest::Response,
        id: &str,
        local_version: Option<i64>,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::classify(status, id, local_version, body))
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VersionField {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct StorageField {
    value: String,
}

#[derive(Debug, Deserialize)]
struct BodyField {
    storage: StorageField,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: String,
    title: String,
    version: VersionField,
    body: BodyField,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    version: VersionField,
}

#[derive(Debug, Deserialize)]
struct AttachmentExtensions {
    #[serde(rename = "mediaType", default)]
    media_type: Option<String>,
    #[serde(rename = "fileSize", default)]
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AttachmentLinks {
    #[serde(default)]
    download: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    id: String,
    title: String,
    version: VersionField,
    #[serde(default)]
    extensions: Option<AttachmentExtensions>,
    #[serde(rename = "_links", default)]
    links: Option<AttachmentLinks>,
}

#[derive(Debug, Deserialize)]
struct AttachmentListResponse {
    results: Vec<AttachmentResponse>,
}

impl AttachmentResponse {
    fn into_remote(self) -> RemoteAttachment {
        let extensions = self.extensions.unwrap_or(AttachmentExtensions {
            media_type: None,
            file_size: None,
        });
        RemoteAttachment {
            id: self.id,
            title: self.title,
            version: self.version.number,
            download_url: self.links.and_then(|l| l.download).unwrap_or_default(),
            file_size: extensions.file_size.unwrap_or(0),
            media_type: extensions
                .media_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        }
    }
}

// ── Trait implementation ──────────────────────────────────────

impl RemoteWiki for HttpWikiClient {
    async fn get_page(&self, id: &str, opts: &CallOptions) -> Result<RemotePage> {
        guard(opts, async {
            let url = self.api_url(&format!("/rest/api/content/{id}"));
            let response = self
                .client
                .get(&url)
                .query(&[("expand", "body.storage,version")])
                .header("Authorization", self.bearer())
                .send()
                .await?;
            let response = Self::check(response, id, None).await?;
            let page: PageResponse = response.json().await?;
            Ok(RemotePage {
                id: page.id,
                title: page.title,
                version: page.version.number,
                body_storage: page.body.storage.value,
            })
        })
        .await
    }

    async fn update_page(&self, id: &str, update: PageUpdate, opts: &CallOptions) -> Result<i64> {
        guard(opts, async {
            let url = self.api_url(&format!("/rest/api/content/{id}"));
            // The API wants the number the page should move to; a stale
            // expectation surfaces as a 409.
            let payload = serde_json::json!({
                "id": id,
                "type": "page",
                "title": update.title,
                "version": { "number": update.expected_version + 1 },
                "body": {
                    "storage": {
                        "value": update.body_storage,
                        "representation": "storage",
                    }
                }
            });
            let response = self
                .client
                .put(&url)
                .header("Authorization", self.bearer())
                .json(&payload)
                .send()
                .await?;
            let response = Self::check(response, id, Some(update.expected_version)).await?;
            let updated: UpdateResponse = response.json().await?;
            Ok(updated.version.number)
        })
        .await
    }

    async fn list_attachments(
        &self,
        id: &str,
        opts: &CallOptions,
    ) -> Result<Vec<RemoteAttachment>> {
        guard(opts, async {
            let url = self.api_url(&format!("/rest/api/content/{id}/child/attachment"));
            let mut start = 0usize;
            let mut all = Vec::new();
            loop {
                let response = self
                    .client
                    .get(&url)
                    .query(&[
                        ("expand", "version".to_string()),
                        ("limit", ATTACHMENT_PAGE_LIMIT.to_string()),
                        ("start", start.to_string()),
                    ])
                    .header("Authorization", self.bearer())
                    .send()
                    .await?;
                let response = Self::check(response, id, None).await?;
                let listing: AttachmentListResponse = response.json().await?;
                let count = listing.results.len();
                all.extend(listing.results.into_iter().map(AttachmentResponse::into_remote));
                if count < ATTACHMENT_PAGE_LIMIT {
                    break;
                }
                start += count;
            }
            Ok(all)
        })
        .await
    }

    async fn upload_attachment(
        &self,
        id: &str,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
        opts: &CallOptions,
    ) -> Result<RemoteAttachment> {
        guard(opts, async {
            let url = self.api_url(&format!("/rest/api/content/{id}/child/attachment"));
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(filename.to_string())
                .mime_str(content_type)
                .map_err(|e| Error::InvalidArgument(format!("bad content type: {e}")))?;
            let form = reqwest::multipart::Form::new().part("file", part);
            let response = self
                .client
                .post(&url)
                .header("Authorization", self.bearer())
                .header("X-Atlassian-Token", "nocheck")
                .multipart(form)
                .send()
                .await?;
            let response = Self::check(response, id, None).await?;
            let listing: AttachmentListResponse = response.json().await?;
            listing
                .results
                .into_iter()
                .next()
                .map(AttachmentResponse::into_remote)
                .ok_or_else(|| Error::RemoteUnknown {
                    status: 200,
                    message: "upload response contained no attachment".to_string(),
                })
        })
        .await
    }

    async fn download_attachment(
        &self,
        id: &str,
        attachment: &RemoteAttachment,
        opts: &CallOptions,
    ) -> Result<Vec<u8>> {
        guard(opts, async {
            let url = self.download_url(&attachment.download_url);
            let response = self
                .client
                .get(&url)
                .header("Authorization", self.bearer())
                .send()
                .await?;
            let response = Self::check(response, id, None).await?;
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpWikiClient::new("https://wiki.example.com/", "t".into());
        assert_eq!(
            client.api_url("/rest/api/content/1"),
            "https://wiki.example.com/rest/api/content/1"
        );
    }

    #[test]
    fn test_relative_download_url_resolved() {
        let client = HttpWikiClient::new("https://wiki.example.com", "t".into());
        assert_eq!(
            client.download_url("/download/attachments/1/a.png"),
            "https://wiki.example.com/download/attachments/1/a.png"
        );
        assert_eq!(
            client.download_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_status_classification() {
        let classify = |code: u16| {
            HttpWikiClient::classify(
                StatusCode::from_u16(code).unwrap(),
                "123",
                Some(3),
                String::new(),
            )
        };
        assert!(matches!(classify(401), Error::RemoteAuthFailed { status: 401 }));
        assert!(matches!(
            classify(403),
            Error::RemotePermissionDenied { status: 403 }
        ));
        assert!(matches!(classify(404), Error::RemoteNotFound { .. }));
        assert!(matches!(
            classify(409),
            Error::RemoteVersionConflict { local: 3, remote: None }
        ));
        assert!(matches!(classify(429), Error::RemoteRateLimited { .. }));
        assert!(matches!(
            classify(503),
            Error::RemoteServiceError { status: 503 }
        ));
        assert!(matches!(classify(418), Error::RemoteUnknown { status: 418, .. }));
    }
}
