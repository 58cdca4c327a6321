use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::id::{AccountId, BrandId};

/// Social platforms an account can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    Twitter,
    Linkedin,
    Tiktok,
}

impl Platform {
    /// Maximum caption length accepted by the platform.
    pub fn caption_limit(&self) -> usize {
        match self {
            Platform::Instagram => 2_200,
            Platform::Facebook => 63_206,
            Platform::Twitter => 280,
            Platform::Linkedin => 3_000,
            Platform::Tiktok => 2_200,
        }
    }

    /// Maximum number of hashtags the platform accepts per post.
    pub fn hashtag_limit(&self) -> usize {
        match self {
            Platform::Instagram => 30,
            Platform::Tiktok => 30,
            _ => 10,
        }
    }

    /// Whether a post on this platform must carry at least one media item.
    pub fn requires_media(&self) -> bool {
        matches!(self, Platform::Instagram | Platform::Tiktok)
    }

    /// Whether publishing is implemented through the Meta Graph API.
    pub fn is_meta(&self) -> bool {
        matches!(self, Platform::Instagram | Platform::Facebook)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Instagram => write!(f, "instagram"),
            Platform::Facebook => write!(f, "facebook"),
            Platform::Twitter => write!(f, "twitter"),
            Platform::Linkedin => write!(f, "linkedin"),
            Platform::Tiktok => write!(f, "tiktok"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "tiktok" => Ok(Platform::Tiktok),
            other => Err(format!("invalid platform: '{other}'")),
        }
    }
}

/// Connection state of a social account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Expired,
    Disconnected,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Expired => write!(f, "expired"),
            AccountStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "expired" => Ok(AccountStatus::Expired),
            "disconnected" => Ok(AccountStatus::Disconnected),
            other => Err(format!("invalid account status: '{other}'")),
        }
    }
}

/// A social account connected to a brand.
///
/// `access_token` is plaintext only while in memory; repositories encrypt it
/// at rest and it is never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    pub id: AccountId,
    pub brand_id: BrandId,
    pub platform: Platform,
    /// Public handle, without a leading `@`.
    pub handle: String,
    /// Platform-side identifier (Instagram business user id, Facebook page id).
    pub external_id: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub status: AccountStatus,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialAccount {
    /// True when the token has an expiry that is at or before `now`.
    pub fn token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_some_and(|exp| exp <= now)
    }

    /// An account can publish when it is active and its token is still valid.
    pub fn is_publishable(&self, now: DateTime<Utc>) -> bool {
        self.status == AccountStatus::Active && !self.token_expired(now)
    }
}

/// Request to connect a social account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectAccountRequest {
    pub platform: Platform,
    pub handle: String,
    pub external_id: String,
    pub display_name: Option<String>,
    pub access_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
}
