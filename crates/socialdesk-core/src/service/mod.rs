//! Business logic services (use cases).
//!
//! Services orchestrate repository calls, platform calls, and business
//! rules. They depend on traits (ports) -- never on concrete infrastructure
//! implementations.

pub mod account;
pub mod brand;
pub mod calendar;
pub mod content;
pub mod inbox;
pub mod media;
pub mod post;
pub mod product;
pub mod publish;
pub mod storage;

use socialdesk_types::brand::UserRole;
use socialdesk_types::id::UserId;

/// Who is performing an operation.
///
/// REST requests act as the user owning the API key. CLI commands act as
/// an anonymous owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub role: UserRole,
}

impl Actor {
    pub fn user(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    /// Local operator with full rights (CLI, scheduler).
    pub fn system() -> Self {
        Self {
            user_id: None,
            role: UserRole::Owner,
        }
    }
}
