//! Types for AI-assisted content generation.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::account::Platform;

/// Voice to write captions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Playful,
    Bold,
    Informative,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Friendly => write!(f, "friendly"),
            Tone::Professional => write!(f, "professional"),
            Tone::Playful => write!(f, "playful"),
            Tone::Bold => write!(f, "bold"),
            Tone::Informative => write!(f, "informative"),
        }
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "friendly" => Ok(Tone::Friendly),
            "professional" => Ok(Tone::Professional),
            "playful" => Ok(Tone::Playful),
            "bold" => Ok(Tone::Bold),
            "informative" => Ok(Tone::Informative),
            other => Err(format!("invalid tone: '{other}'")),
        }
    }
}

/// Sampling options for a text generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_output_tokens: 1024,
        }
    }
}

/// A generated (or fallback) image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Request for a caption draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRequest {
    /// What the post is about.
    pub brief: String,
    pub platform: Platform,
    #[serde(default)]
    pub tone: Tone,
    /// Optional brand or product context added to the brief.
    pub context: Option<String>,
}

/// A generated caption split into body and hashtags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionDraft {
    pub content: String,
    pub hashtags: Vec<String>,
}
