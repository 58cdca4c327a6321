//! Infrastructure layer for SocialDesk.
//!
//! Implements the ports defined in `socialdesk-core`: SQLite repositories,
//! the Meta Graph API publisher and webhook parser, the Gemini content
//! generator, Cloudinary/Unsplash media adapters, the slide compositor, and
//! the AES-256-GCM token vault.

pub mod config;
pub mod crypto;
pub mod gemini;
pub mod http;
pub mod media;
pub mod meta;
pub mod sqlite;
