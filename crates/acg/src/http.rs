//! The HTTP client shared by all parsers.

use reqwest::{header::CONTENT_TYPE, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Headers of a desktop Chrome, used by most parsers.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36",
    ),
    ("referer", "https://google.de"),
];

/// Reverso rejects requests that don't look like they come from Firefox.
pub const REVERSO_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:74.0) Gecko/20100101 Firefox/74.0",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "de,en-US;q=0.7,en;q=0.3"),
    ("referer", "https://google.com"),
];

pub const LINGUEE_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) snap Chromium/80.0.3987.162 Chrome/80.0.3987.162 Safari/537.36",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
    ),
    ("accept-language", "de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7"),
];

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Failed to build the HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Response from {url} is not the expected JSON")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A GET request as described by a parser.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: Url,
    pub headers: &'static [(&'static str, &'static str)],
}

impl RequestSpec {
    pub fn new(url: Url, headers: &'static [(&'static str, &'static str)]) -> Self {
        Self { url, headers }
    }
}

/// The body and metadata of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl RawResponse {
    /// A 200 response, mostly useful for feeding fixtures to parsers.
    pub fn ok(
        url: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Wraps a [`reqwest::Client`] with a bounded timeout.
///
/// Constructed once at start-up and passed to whatever needs network access.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, RequestError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RequestError::Client)?;
        Ok(Self { inner })
    }

    /// Issues a GET request. Non-success statuses are errors; nothing is retried.
    pub async fn get(&self, spec: &RequestSpec) -> Result<RawResponse, RequestError> {
        let url = spec.url.to_string();
        let response = self.send(spec).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| RequestError::Transport {
                url: url.clone(),
                source,
            })?;
        tracing::trace!("GET {url} returned {} bytes", body.len());

        Ok(RawResponse {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    /// Issues a GET request and deserializes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
    ) -> Result<T, RequestError> {
        self.send(spec)
            .await?
            .json()
            .await
            .map_err(|source| RequestError::Decode {
                url: spec.url.to_string(),
                source,
            })
    }

    async fn send(&self, spec: &RequestSpec) -> Result<Response, RequestError> {
        let url = spec.url.to_string();
        tracing::debug!("GET {url}");
        let mut request = self.inner.get(spec.url.clone());
        for (name, value) in spec.headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .map_err(|source| RequestError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {url} returned {status}");
            return Err(RequestError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Downloads a binary resource like an image or an audio file.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RequestError> {
        tracing::debug!("Downloading {url}");
        let transport = |source| RequestError::Transport {
            url: url.to_string(),
            source,
        };
        let mut request = self.inner.get(url);
        for (name, value) in DEFAULT_HEADERS {
            request = request.header(*name, *value);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}
