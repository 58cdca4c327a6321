//! Shared domain types for SocialDesk.
//!
//! This crate contains the core domain types used across the SocialDesk
//! platform: Brand, User, SocialAccount, Post, PostItem, Conversation,
//! Message, MediaAsset, Product, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod account;
pub mod brand;
pub mod config;
pub mod content;
pub mod error;
pub mod id;
pub mod inbox;
pub mod media;
pub mod post;
