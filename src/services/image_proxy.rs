//! Image download proxy
//!
//! Generated images are served from short-lived provider URLs that the
//! browser cannot fetch cross-origin. The editing console downloads them
//! through this proxy before uploading them to the CMS.

use std::time::Duration;

use reqwest::Url;

/// Hosts images may be downloaded from, subdomains included
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "oaidalleapiprodscus.blob.core.windows.net",
    "dalleprodsec.blob.core.windows.net",
    "oaidalle.blob.core.windows.net",
];

/// Largest image the proxy will relay
pub const MAX_SIZE_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Error types for proxied downloads
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Invalid url parameter")]
    InvalidUrl,

    #[error("URL not allowed")]
    NotAllowed,

    #[error("Failed to download image: {0}")]
    Upstream(u16),

    #[error("Image too large")]
    TooLarge,

    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

/// A downloaded image
#[derive(Debug, Clone)]
pub struct ProxiedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Downloads images from allow-listed hosts
#[derive(Debug, Clone)]
pub struct ImageProxy {
    http: reqwest::Client,
    allowed_hosts: Vec<String>,
    max_size: usize,
}

impl ImageProxy {
    pub fn new() -> Result<Self, ProxyError> {
        // Redirects would bypass the host allow-list
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            max_size: MAX_SIZE_BYTES,
        })
    }

    /// Replace the host allow-list
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Parse `raw` and check it against the allow-list
    pub fn validate(&self, raw: Option<&str>) -> Result<Url, ProxyError> {
        let raw = raw.filter(|u| !u.is_empty()).ok_or(ProxyError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl)?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::NotAllowed);
        }
        let host = url.host_str().unwrap_or("");
        if !self.allowed_hosts.iter().any(|allowed| host_matches(host, allowed)) {
            return Err(ProxyError::NotAllowed);
        }
        Ok(url)
    }

    /// Download an image, enforcing the size limit on both the declared
    /// `Content-Length` and the bytes actually received
    pub async fn fetch(&self, raw: Option<&str>) -> Result<ProxiedImage, ProxyError> {
        let url = self.validate(raw)?;

        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Image download failed with {}", status);
            return Err(ProxyError::Upstream(status.as_u16()));
        }

        if response.content_length().is_some_and(|len| len > self.max_size as u64) {
            return Err(ProxyError::TooLarge);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_size {
                return Err(ProxyError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(ProxiedImage { bytes, content_type })
    }
}

/// `host` is `allowed` itself or one of its subdomains
fn host_matches(host: &str, allowed: &str) -> bool {
    match host.strip_suffix(allowed) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}
