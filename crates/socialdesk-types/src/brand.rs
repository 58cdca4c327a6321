use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::id::{BrandId, UserId};

/// A brand (tenant) in SocialDesk.
///
/// Every social account, post, conversation, and media asset belongs to
/// exactly one brand. All queries are scoped by `BrandId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    /// URL-safe unique slug derived from name ("Acme Coffee" -> "acme-coffee").
    pub slug: String,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    /// When true, posts must be approved by an owner/admin before they can be
    /// scheduled or published.
    pub requires_approval: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub requires_approval: bool,
}

/// Partial update of a brand's mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub requires_approval: Option<bool>,
}

/// A member of a brand's team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub brand_id: BrandId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Team roles.
///
/// - Owner/Admin: full access, can approve posts
/// - Editor: can compose, schedule (when approval is not required), and reply
/// - Viewer: read-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    pub fn can_approve(&self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Admin)
    }

    pub fn can_edit(&self) -> bool {
        !matches!(self, UserRole::Viewer)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Owner => write!(f, "owner"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Editor => write!(f, "editor"),
            UserRole::Viewer => write!(f, "viewer"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(UserRole::Owner),
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(format!("invalid user role: '{other}'")),
        }
    }
}

/// Request to add a user to a brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Option<UserRole>,
}

/// Caller identity resolved from an API key. Every request is scoped to
/// `brand_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub role: UserRole,
}

/// Metadata of an issued API key. The secret itself is shown once at
/// creation and only its hash is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub prefix: String,
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Generate a URL-safe slug from a display name.
///
/// # Examples
///
/// ```
/// use socialdesk_types::brand::slugify;
///
/// assert_eq!(slugify("Acme Coffee"), "acme-coffee");
/// assert_eq!(slugify("  Bloom & Co.  "), "bloom-co");
/// ```
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_hyphen = true;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }
    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
