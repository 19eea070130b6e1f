use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::constants::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::error::{DataUrlError, FetchError};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A self-contained `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    url: String,
    // Byte offset of the payload inside `url`
    payload_start: usize,
}

impl EncodedImage {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let prefix = format!("data:{};base64,", mime);
        let payload_start = prefix.len();
        let mut url = prefix;
        STANDARD.encode_string(bytes, &mut url);
        Self { url, payload_start }
    }

    /// Reads a local file and inlines it, guessing the mime type from the extension.
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let bytes = std::fs::read(path).map_err(|source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(mime_from_extension(path), &bytes))
    }

    pub fn parse(s: &str) -> Result<Self, DataUrlError> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| DataUrlError("missing data: scheme".to_string()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| DataUrlError("missing ;base64, marker".to_string()))?;
        if mime.is_empty() || !mime.contains('/') {
            return Err(DataUrlError(format!("bad media type '{}'", mime)));
        }
        STANDARD
            .decode(payload)
            .map_err(|e| DataUrlError(e.to_string()))?;
        Ok(Self {
            url: s.to_string(),
            payload_start: s.len() - payload.len(),
        })
    }

    pub fn mime(&self) -> &str {
        // "data:" is 5 bytes, ";base64," is 8
        &self.url[5..self.payload_start - 8]
    }

    pub fn payload(&self) -> &str {
        &self.url[self.payload_start..]
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        STANDARD
            .decode(self.payload())
            .map_err(|e| DataUrlError(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Anything that can resolve an image URL to a data-URL.
pub trait ImageSource: Send + Sync {
    fn fetch_data_url(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<EncodedImage, FetchError>> + Send;
}

/// Fetches images over HTTP(S).
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    /// Falls back to a client without a timeout, with a warning, if the
    /// configured client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    error = %e,
                    "could not build HTTP client with timeout, requests will not time out"
                );
                reqwest::Client::new()
            }
        };
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for HttpImageFetcher {
    async fn fetch_data_url(&self, url: &str) -> Result<EncodedImage, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(media_type)
            .unwrap_or_else(|| mime_from_extension(Path::new(strip_query(url))).to_string());

        let body = response.bytes().await.map_err(request_error)?;
        tracing::debug!(url, mime = %mime, bytes = body.len(), "fetched image");

        // Encoding runs on the blocking pool and is awaited
        tokio::task::spawn_blocking(move || EncodedImage::from_bytes(&mime, &body))
            .await
            .map_err(|e| FetchError::Encode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// `image/jpeg; charset=binary` -> `image/jpeg`
fn media_type(header: &str) -> Option<String> {
    let essence = header.split(';').next()?.trim();
    if essence.is_empty() || !essence.contains('/') {
        return None;
    }
    Some(essence.to_ascii_lowercase())
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Simple MIME type detection based on file extension
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("heic") | Some("heif") => "image/heic",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_MIME,
    }
}
