//! Meta Graph API integration (Instagram business accounts, Facebook pages).

pub mod client;
pub mod types;
pub mod webhook;

pub use client::MetaGraphClient;
