//! Google Gemini text and image generation.

pub mod client;
pub mod types;

pub use client::GeminiClient;
