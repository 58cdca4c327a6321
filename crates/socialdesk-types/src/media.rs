use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::id::{BrandId, MediaId, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("invalid media kind: '{other}'")),
        }
    }
}

/// Where a media asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Upload,
    Unsplash,
    Generated,
    Composited,
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Upload => write!(f, "upload"),
            MediaSource::Unsplash => write!(f, "unsplash"),
            MediaSource::Generated => write!(f, "generated"),
            MediaSource::Composited => write!(f, "composited"),
        }
    }
}

impl FromStr for MediaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upload" => Ok(MediaSource::Upload),
            "unsplash" => Ok(MediaSource::Unsplash),
            "generated" => Ok(MediaSource::Generated),
            "composited" => Ok(MediaSource::Composited),
            other => Err(format!("invalid media source: '{other}'")),
        }
    }
}

/// A hosted image or video in a brand's library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: MediaId,
    pub brand_id: BrandId,
    /// Public HTTPS URL (what the platforms fetch when publishing).
    pub url: String,
    /// Storage-side identifier (Cloudinary public id), if hosted by us.
    pub public_id: Option<String>,
    pub kind: MediaKind,
    pub source: MediaSource,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: Option<u64>,
    pub alt_text: Option<String>,
    /// Photographer credit for stock images.
    pub attribution: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored asset after upload to the media host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: Option<u64>,
}

/// A stock photo search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPhoto {
    pub id: String,
    pub description: Option<String>,
    pub url: String,
    pub thumb_url: String,
    pub width: u32,
    pub height: u32,
    pub photographer: String,
    pub photographer_url: Option<String>,
    /// Endpoint that must be pinged when the photo is used.
    pub download_location: Option<String>,
}

/// A catalog product that posts can feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: BrandId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: String,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Human price string such as `$12.50` or `12.50 EUR`.
    pub fn formatted_price(&self) -> Option<String> {
        let cents = self.price_cents?;
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let amount = format!("{}.{:02}", abs / 100, abs % 100);
        Some(match self.currency.to_uppercase().as_str() {
            "USD" => format!("{sign}${amount}"),
            "EUR" => format!("{sign}€{amount}"),
            "GBP" => format!("{sign}£{amount}"),
            other => format!("{sign}{amount} {other}"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// RGB color used by slide rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` / `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let h = hex.trim().trim_start_matches('#');
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&h[0..2], 16).ok()?;
        let g = u8::from_str_radix(&h[2..4], 16).ok()?;
        let b = u8::from_str_radix(&h[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }
}

/// One slide of a carousel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselSlide {
    pub headline: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Photo to use as background; a gradient is drawn when absent or when
    /// the photo cannot be fetched.
    pub background_url: Option<String>,
    /// Accent color as `#rrggbb`.
    pub accent: Option<String>,
}

/// Fully resolved rendering input for one slide.
#[derive(Debug, Clone)]
pub struct SlideSpec {
    pub width: u32,
    pub height: u32,
    pub headline: String,
    pub body: Option<String>,
    /// Encoded background photo bytes, already downloaded.
    pub background: Option<Vec<u8>>,
    pub gradient_from: Rgb,
    pub gradient_to: Rgb,
    pub text_color: Rgb,
    /// Slide position label, e.g. "2/5".
    pub footer: Option<String>,
}
