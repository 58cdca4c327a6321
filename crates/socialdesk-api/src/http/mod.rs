//! HTTP/REST API layer for SocialDesk.
//!
//! Axum-based REST API at `/api/v1/` with per-user API key authentication,
//! the envelope response format, and the Meta webhook receiver.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
