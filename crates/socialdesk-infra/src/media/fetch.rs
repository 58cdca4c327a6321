//! Remote image download for slide backgrounds.

use std::time::Duration;

use socialdesk_core::service::storage::MediaFetcher;
use socialdesk_types::error::MediaError;

/// Largest body accepted from a remote image URL.
pub const MAX_FETCH_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpMediaFetcher {
    pub fn new() -> Self {
        let client = crate::http::client_with_timeout(Duration::from_secs(30));
        Self {
            client,
            max_bytes: MAX_FETCH_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(MediaError::Validation(format!("not an http(s) url: {url}")));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Fetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Fetch(format!("HTTP {status} from {url}")));
        }
        if response.content_length().is_some_and(|len| len as usize > self.max_bytes) {
            return Err(MediaError::Fetch(format!("{url} exceeds {} bytes", self.max_bytes)));
        }

        let bytes = response.bytes().await.map_err(|e| MediaError::Fetch(e.to_string()))?;
        if bytes.len() > self.max_bytes {
            return Err(MediaError::Fetch(format!("{url} exceeds {} bytes", self.max_bytes)));
        }
        Ok(bytes.to_vec())
    }
}
