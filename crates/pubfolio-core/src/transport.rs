//! HTTP transport and person-record sources.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::DEFAULT_URL_TEMPLATE;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no response from {url} (HTTP {status})")]
    NoResponse { url: String, status: u16 },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("could not serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("response is not JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("background task failed: {0}")]
    Join(String),
}

/// Somewhere the XML record of a DBLP person can be read from.
pub trait PersonSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Raw XML of the person identified by `pid` (e.g. `84/5849`).
    fn fetch_xml<'a>(
        &'a self,
        pid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + 'a>>;
}

/// HTTP client for the DBLP person endpoint and JSON submissions.
#[derive(Debug, Clone)]
pub struct DblpClient {
    client: reqwest::Client,
    url_template: String,
    timeout: Option<Duration>,
}

impl Default for DblpClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_URL_TEMPLATE)
    }
}

impl DblpClient {
    pub fn new(client: reqwest::Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The person URL for `pid`. The pid is inserted as-is since DBLP pids
    /// contain a path separator.
    pub fn person_url(&self, pid: &str) -> String {
        self.url_template.replace("{pid}", pid)
    }

    /// GET the person record and return the body text.
    pub async fn fetch_xml(&self, pid: &str) -> Result<String, TransportError> {
        let url = self.person_url(pid);
        tracing::debug!(pid, url = %url, "fetching person record");

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::NoResponse {
                url,
                status: status.as_u16(),
            });
        }

        Ok(resp.text().await?)
    }

    /// POST `payload` as JSON and parse the reply as JSON.
    ///
    /// The reply status is not inspected; an error page fails only if its
    /// body is not JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<Value, TransportError> {
        let body = serde_json::to_vec(payload).map_err(TransportError::Serialize)?;

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let resp = request.send().await?;
        tracing::debug!(url, status = resp.status().as_u16(), "JSON post answered");

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(TransportError::InvalidJson)
    }
}

impl PersonSource for DblpClient {
    fn name(&self) -> &str {
        "DBLP"
    }

    fn fetch_xml<'a>(
        &'a self,
        pid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + 'a>> {
        Box::pin(DblpClient::fetch_xml(self, pid))
    }
}

/// Person records previously saved as `<root>/<pid>.xml`.
#[derive(Debug, Clone)]
pub struct LocalDir {
    root: PathBuf,
}

impl LocalDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn person_path(&self, pid: &str) -> PathBuf {
        self.root.join(format!("{pid}.xml"))
    }
}

impl PersonSource for LocalDir {
    fn name(&self) -> &str {
        "local"
    }

    fn fetch_xml<'a>(
        &'a self,
        pid: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + 'a>> {
        let path = self.person_path(pid);
        Box::pin(async move {
            tracing::debug!(pid, path = %path.display(), "reading person record");
            tokio::task::spawn_blocking(move || {
                std::fs::read_to_string(&path).map_err(|source| TransportError::Io { path, source })
            })
            .await
            .map_err(|e| TransportError::Join(e.to_string()))?
        })
    }
}
