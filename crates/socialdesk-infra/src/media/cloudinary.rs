//! Cloudinary signed uploads.
//!
//! Requests are signed with SHA-256 over the alphabetically sorted signed
//! parameters followed by the API secret (`signature_algorithm=sha256`).

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use socialdesk_core::service::storage::MediaStore;
use socialdesk_types::error::MediaError;
use socialdesk_types::media::StoredMedia;

use crate::crypto::hash::sha256_hex;

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

pub struct CloudinaryStore {
    client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: SecretString,
    api_secret: SecretString,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signature over `params` (already excluding `file`, `api_key`, and
/// `signature_algorithm`): `sha256("k1=v1&k2=v2" + secret)` in hex.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    sha256_hex(format!("{to_sign}{api_secret}").as_bytes())
}

/// Encode bytes as a `data:` URI, sniffing the image format for the MIME type.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

impl CloudinaryStore {
    pub fn new(cloud_name: String, api_key: SecretString, api_secret: SecretString) -> Self {
        let client = crate::http::client_with_timeout(Duration::from_secs(120));
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{action}", self.base_url, self.cloud_name)
    }

    /// Add `timestamp`, `api_key`, `signature`, and `signature_algorithm`
    /// to the signed parameters.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        let signature = sign_params(&params, self.api_secret.expose_secret());
        params.push(("api_key", self.api_key.expose_secret().to_string()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, MediaError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .form(params)
            .send()
            .await
            .map_err(|e| MediaError::Upload(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(MediaError::Upload(format!("cloudinary {status}: {message}")));
        }
        serde_json::from_str(&body).map_err(|e| MediaError::Upload(format!("unexpected response: {e}")))
    }
}

impl MediaStore for CloudinaryStore {
    async fn upload(&self, bytes: &[u8], folder: &str, public_id: Option<&str>) -> Result<StoredMedia, MediaError> {
        let mut signed = vec![("folder", folder.to_string())];
        if let Some(public_id) = public_id {
            signed.push(("public_id", public_id.to_string()));
        }
        let mut params = self.signed(signed);
        params.push(("file", data_uri(bytes)));

        let uploaded: UploadResponse = self.post("upload", &params).await?;
        tracing::debug!(public_id = %uploaded.public_id, "uploaded to cloudinary");
        Ok(StoredMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            width: uploaded.width,
            height: uploaded.height,
            bytes: uploaded.bytes.or(Some(bytes.len() as u64)),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let params = self.signed(vec![("public_id", public_id.to_string())]);
        let destroyed: DestroyResponse = self.post("destroy", &params).await?;
        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(MediaError::NotFound),
            other => Err(MediaError::Upload(format!("cloudinary destroy: {other}"))),
        }
    }
}
