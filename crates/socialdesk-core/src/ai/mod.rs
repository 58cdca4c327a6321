//! AI content generation port and text post-processing helpers.

pub mod generator;
pub mod text;
