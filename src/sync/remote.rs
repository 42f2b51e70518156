//! Remote Source
//!
//! Fetches the blob container from a gist-style API:
//! `GET {base}/gists/{id}` with a bearer token, payloads under `files.<name>.content`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::Credentials;
use crate::domain::{BlobName, BlobSet, FetchErrorKind, SyncError, SyncResult};

/// Anything that can produce the compressed payloads of a container
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_blobs(&self, credentials: &Credentials) -> SyncResult<BlobSet>;
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

fn network(e: reqwest::Error) -> SyncError {
    SyncError::fetch(FetchErrorKind::Network, e.to_string())
}

fn status_error(status: StatusCode, body: &str, ctx: &str) -> SyncError {
    let kind = match status.as_u16() {
        401 | 403 => FetchErrorKind::Unauthorized,
        404 => FetchErrorKind::NotFound,
        _ => FetchErrorKind::Http,
    };
    let body: String = body.chars().take(200).collect();
    SyncError::fetch(kind, format!("{ctx} ({status}): {body}"))
}

/// GitHub / Gitee gist client
pub struct GistSource {
    client: reqwest::Client,
}

impl GistSource {
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tabshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(network)?;
        Ok(Self { client })
    }

    fn with_auth_headers(
        req: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", credentials.token))
            .header("Accept", "application/json")
    }

    async fn get_text(&self, url: &str, credentials: &Credentials, ctx: &str) -> SyncResult<String> {
        let req = Self::with_auth_headers(self.client.get(url), credentials);
        let res = req.send().await.map_err(network)?;

        let status = res.status();
        if status.is_success() {
            res.text().await.map_err(network)
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(status_error(status, &body, ctx))
        }
    }

    pub fn container_url(credentials: &Credentials) -> String {
        format!("{}/gists/{}", credentials.api_base(), credentials.blob_id)
    }
}

#[async_trait]
impl SnapshotSource for GistSource {
    async fn fetch_blobs(&self, credentials: &Credentials) -> SyncResult<BlobSet> {
        let url = Self::container_url(credentials);
        log::info!(
            "fetching blob container {} from {}",
            credentials.blob_id,
            credentials.provider_id()
        );

        let body = self.get_text(&url, credentials, "Fetch container").await?;
        let (mut blobs, truncated) = parse_container(&body)?;

        // Large files are cut off in the container response and must be read from raw_url
        for (name, raw_url) in truncated {
            log::debug!("blob '{}' truncated, fetching raw content", name.as_str());
            let content = self.get_text(&raw_url, credentials, "Fetch raw blob").await?;
            blobs.insert(name, content);
        }

        log::info!("fetched {} blobs", blobs.len());
        Ok(blobs)
    }
}

/// Split a container response into inline payloads and truncated files to re-fetch
fn parse_container(body: &str) -> SyncResult<(BlobSet, Vec<(BlobName, String)>)> {
    let gist: GistResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::fetch(FetchErrorKind::Parse, e.to_string()))?;

    let mut blobs = BlobSet::new();
    let mut truncated = Vec::new();
    for (file_name, file) in gist.files {
        let (Some(name), Some(file)) = (BlobName::parse(&file_name), file) else {
            continue;
        };
        match (file.truncated, file.raw_url) {
            (true, Some(raw_url)) => truncated.push((name, raw_url)),
            _ => {
                if let Some(content) = file.content {
                    blobs.insert(name, content);
                }
            }
        }
    }
    truncated.sort();
    Ok((blobs, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    #[test]
    fn test_container_url_per_provider() {
        let github = Credentials::new(Provider::Github, "abc123", "t");
        assert_eq!(
            GistSource::container_url(&github),
            "https://api.github.com/gists/abc123"
        );

        let gitee = Credentials::new(Provider::Gitee, "abc123", "t");
        assert_eq!(
            GistSource::container_url(&gitee),
            "https://gitee.com/api/v5/gists/abc123"
        );
    }

    #[test]
    fn test_parse_container_extracts_known_files() {
        let body = serde_json::json!({
            "id": "abc",
            "files": {
                "spaces": {"content": "S", "truncated": false},
                "cards": {"content": "partial", "truncated": true, "raw_url": "https://raw/cards"},
                "notes.md": {"content": "ignored"},
                "labels": null
            }
        })
        .to_string();

        let (blobs, truncated) = parse_container(&body).unwrap();
        assert_eq!(blobs.get(BlobName::Spaces), Some("S"));
        assert_eq!(blobs.get(BlobName::Cards), None);
        assert_eq!(blobs.len(), 1);
        assert_eq!(truncated, vec![(BlobName::Cards, "https://raw/cards".to_string())]);
    }

    #[test]
    fn test_parse_container_rejects_non_json() {
        let err = parse_container("<html>").unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Parse));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, "", "x").fetch_kind(),
            Some(FetchErrorKind::Unauthorized)
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, "", "x").fetch_kind(),
            Some(FetchErrorKind::Unauthorized)
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "", "x").fetch_kind(),
            Some(FetchErrorKind::NotFound)
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "", "x").fetch_kind(),
            Some(FetchErrorKind::Http)
        );
    }
}
