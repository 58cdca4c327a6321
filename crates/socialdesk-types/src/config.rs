//! Global configuration types for SocialDesk.
//!
//! `GlobalConfig` represents the top-level `config.toml` in the data
//! directory. Secrets never live here; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Meta Graph API publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Seconds between media container status checks.
    #[serde(default = "default_poll_interval")]
    pub container_poll_interval_secs: u64,
    /// Status checks before a container is considered stuck.
    #[serde(default = "default_poll_attempts")]
    pub container_poll_max_attempts: u32,
    #[serde(default = "default_graph_version")]
    pub graph_api_version: String,
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
}

fn default_poll_interval() -> u64 {
    4
}

fn default_poll_attempts() -> u32 {
    30
}

fn default_graph_version() -> String {
    "v19.0".to_string()
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            container_poll_interval_secs: default_poll_interval(),
            container_poll_max_attempts: default_poll_attempts(),
            graph_api_version: default_graph_version(),
            graph_base_url: default_graph_base_url(),
        }
    }
}

/// Background publisher for scheduled posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the worker inside `serve`.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick")]
    pub tick_interval_secs: u64,
    /// Maximum posts published per tick.
    #[serde(default = "default_batch")]
    pub batch_size: i64,
}

fn default_true() -> bool {
    true
}

fn default_tick() -> u64 {
    60
}

fn default_batch() -> i64 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: default_tick(),
            batch_size: default_batch(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.0-flash-preview-image-generation".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_tokens(),
            base_url: default_gemini_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloudinary_cloud_name: Option<String>,
    #[serde(default = "default_folder")]
    pub cloudinary_folder: String,
    /// TTF/OTF font used for slide text. Slides render without text when unset.
    pub font_path: Option<String>,
    #[serde(default = "default_slide_size")]
    pub slide_width: u32,
    #[serde(default = "default_slide_size")]
    pub slide_height: u32,
}

fn default_folder() -> String {
    "socialdesk".to_string()
}

fn default_slide_size() -> u32 {
    1080
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloudinary_cloud_name: None,
            cloudinary_folder: default_folder(),
            font_path: None,
            slide_width: default_slide_size(),
            slide_height: default_slide_size(),
        }
    }
}
