//! Unsplash stock photo search.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use socialdesk_core::service::storage::StockPhotoSearch;
use socialdesk_types::error::MediaError;
use socialdesk_types::media::StockPhoto;

const DEFAULT_BASE_URL: &str = "https://api.unsplash.com";

pub struct UnsplashClient {
    client: reqwest::Client,
    base_url: String,
    access_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alt_description: Option<String>,
    width: u32,
    height: u32,
    urls: PhotoUrls,
    user: Photographer,
    #[serde(default)]
    links: Option<PhotoLinks>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
    #[serde(default)]
    small: Option<String>,
    thumb: String,
}

#[derive(Debug, Deserialize)]
struct Photographer {
    name: String,
    #[serde(default)]
    links: Option<UserLinks>,
}

#[derive(Debug, Deserialize)]
struct UserLinks {
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoLinks {
    download_location: Option<String>,
}

impl From<UnsplashPhoto> for StockPhoto {
    fn from(p: UnsplashPhoto) -> Self {
        StockPhoto {
            id: p.id,
            description: p.description.or(p.alt_description),
            url: p.urls.regular,
            thumb_url: p.urls.small.unwrap_or(p.urls.thumb),
            width: p.width,
            height: p.height,
            photographer: p.user.name,
            photographer_url: p.user.links.and_then(|l| l.html),
            download_location: p.links.and_then(|l| l.download_location),
        }
    }
}

impl UnsplashClient {
    pub fn new(access_key: SecretString) -> Self {
        let client = crate::http::client_with_timeout(Duration::from_secs(30));
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, MediaError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Authorization", format!("Client-ID {}", self.access_key.expose_secret()))
            .header("Accept-Version", "v1")
            .send()
            .await
            .map_err(|e| MediaError::StockSearch(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => MediaError::StockSearch("unsplash rejected the access key".to_string()),
            403 | 429 => MediaError::StockSearch("unsplash rate limit reached".to_string()),
            _ => MediaError::StockSearch(format!("HTTP {status}: {body}")),
        })
    }
}

impl StockPhotoSearch for UnsplashClient {
    async fn search(&self, query: &str, per_page: u32) -> Result<Vec<StockPhoto>, MediaError> {
        let url = format!("{}/search/photos", self.base_url);
        let response = self
            .get(
                &url,
                &[
                    ("query", query.to_string()),
                    ("per_page", per_page.to_string()),
                    ("content_filter", "high".to_string()),
                ],
            )
            .await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| MediaError::StockSearch(format!("unexpected response: {e}")))?;

        tracing::debug!(query, hits = parsed.results.len(), "unsplash search");
        Ok(parsed.results.into_iter().map(StockPhoto::from).collect())
    }

    async fn track_download(&self, photo: &StockPhoto) -> Result<(), MediaError> {
        let Some(location) = photo.download_location.as_deref() else {
            return Ok(());
        };
        self.get(location, &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> UnsplashClient {
        UnsplashClient::new(SecretString::from("ak")).with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "coffee"))
            .and(query_param("per_page", "2"))
            .and(header("Authorization", "Client-ID ak"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "results": [{
                    "id": "abc",
                    "description": null,
                    "alt_description": "cup of coffee",
                    "width": 4000, "height": 3000,
                    "urls": {"regular": "https://images.unsplash.com/r", "small": "https://images.unsplash.com/s", "thumb": "https://images.unsplash.com/t"},
                    "user": {"name": "Ana", "links": {"html": "https://unsplash.com/@ana"}},
                    "links": {"download_location": format!("{}/photos/abc/download", server.uri())}
                }]
            })))
            .mount(&server)
            .await;

        let photos = client(&server).search("coffee", 2).await.unwrap();
        assert_eq!(photos.len(), 1);
        let p = &photos[0];
        assert_eq!(p.description.as_deref(), Some("cup of coffee"));
        assert_eq!(p.thumb_url, "https://images.unsplash.com/s");
        assert_eq!(p.photographer, "Ana");
        assert_eq!(p.photographer_url.as_deref(), Some("https://unsplash.com/@ana"));
    }

    #[tokio::test]
    async fn test_track_download_pings_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photos/abc/download"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://x"})))
            .expect(1)
            .mount(&server)
            .await;

        let photo = StockPhoto {
            id: "abc".to_string(),
            description: None,
            url: "https://images.unsplash.com/r".to_string(),
            thumb_url: "https://images.unsplash.com/t".to_string(),
            width: 1,
            height: 1,
            photographer: "Ana".to_string(),
            photographer_url: None,
            download_location: Some(format!("{}/photos/abc/download", server.uri())),
        };
        client(&server).track_download(&photo).await.unwrap();

        let untracked = StockPhoto {
            download_location: None,
            ..photo
        };
        client(&server).track_download(&untracked).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Rate Limit Exceeded"))
            .mount(&server)
            .await;

        let err = client(&server).search("coffee", 5).await.unwrap_err();
        assert!(matches!(err, MediaError::StockSearch(m) if m.contains("rate limit")));
    }
}
