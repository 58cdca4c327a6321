//! REST API request handlers.

pub mod account;
pub mod ai;
pub mod brand;
pub mod calendar;
pub mod health;
pub mod inbox;
pub mod media;
pub mod post;
pub mod product;
pub mod webhook;

use std::str::FromStr;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;

/// Parse a path identifier; malformed ids are reported as missing.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::NotFound(format!("{what} '{raw}' not found")))
}

pub(crate) fn require_editor(auth: &Authenticated) -> Result<(), AppError> {
    if auth.0.role.can_edit() {
        Ok(())
    } else {
        Err(AppError::Forbidden("viewers have read-only access".to_string()))
    }
}

pub(crate) fn require_admin(auth: &Authenticated) -> Result<(), AppError> {
    if auth.0.role.can_approve() {
        Ok(())
    } else {
        Err(AppError::Forbidden("only owners and admins can do this".to_string()))
    }
}
