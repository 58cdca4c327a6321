//! Configuration loading.
//!
//! `config.toml` in the data directory holds non-secret settings
//! ([`GlobalConfig`]). Integration credentials come only from the
//! environment and are wrapped in [`SecretString`].

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use socialdesk_types::config::GlobalConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SOCIALDESK_DATA_DIR";

/// Resolve the data directory: `SOCIALDESK_DATA_DIR`, else `~/.socialdesk`.
pub fn data_dir() -> PathBuf {
    resolve_data_dir(std::env::var(DATA_DIR_ENV).ok(), dirs::home_dir())
}

fn resolve_data_dir(env: Option<String>, home: Option<PathBuf>) -> PathBuf {
    match env.filter(|v| !v.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => home.unwrap_or_else(|| PathBuf::from(".")).join(".socialdesk"),
    }
}

/// Load `{data_dir}/config.toml`.
///
/// A missing file yields defaults silently; an unreadable or malformed file
/// yields defaults with a warning.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            GlobalConfig::default()
        }
    }
}

/// Write `config` to `{data_dir}/config.toml`, creating the directory.
pub async fn save_global_config(data_dir: &Path, config: &GlobalConfig) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = data_dir.join("config.toml");
    tokio::fs::write(&path, toml::to_string_pretty(config)?).await?;
    Ok(path)
}

/// Credentials for external services. Each is optional; features whose
/// credentials are missing report "not configured" when used.
#[derive(Default)]
pub struct IntegrationSecrets {
    pub meta_app_secret: Option<SecretString>,
    pub meta_verify_token: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub cloudinary_api_key: Option<SecretString>,
    pub cloudinary_api_secret: Option<SecretString>,
    pub unsplash_access_key: Option<SecretString>,
}

impl IntegrationSecrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(SecretString::from)
        };
        Self {
            meta_app_secret: get("META_APP_SECRET"),
            meta_verify_token: get("META_VERIFY_TOKEN"),
            gemini_api_key: get("GEMINI_API_KEY"),
            cloudinary_api_key: get("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: get("CLOUDINARY_API_SECRET"),
            unsplash_access_key: get("UNSPLASH_ACCESS_KEY"),
        }
    }

    /// Names of the integrations that have credentials, for `sdesk status`.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.meta_app_secret.is_some() {
            out.push("meta-webhooks");
        }
        if self.gemini_api_key.is_some() {
            out.push("gemini");
        }
        if self.cloudinary_api_key.is_some() && self.cloudinary_api_secret.is_some() {
            out.push("cloudinary");
        }
        if self.unsplash_access_key.is_some() {
            out.push("unsplash");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_data_dir() {
        assert_eq!(
            resolve_data_dir(Some("/srv/sdesk".to_string()), Some(PathBuf::from("/home/a"))),
            PathBuf::from("/srv/sdesk")
        );
        assert_eq!(
            resolve_data_dir(Some("  ".to_string()), Some(PathBuf::from("/home/a"))),
            PathBuf::from("/home/a/.socialdesk")
        );
        assert_eq!(resolve_data_dir(None, None), PathBuf::from("./.socialdesk"));
    }

    #[tokio::test]
    async fn test_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.publishing.container_poll_max_attempts, 30);
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[server]
port = 8080

[scheduler]
tick_interval_secs = 15
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.scheduler.tick_interval_secs, 15);
        assert_eq!(config.scheduler.batch_size, 10);
        assert_eq!(config.media.slide_width, 1080);
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.server.port, 3000);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = GlobalConfig::default();
        config.ai.model = "gemini-2.0-flash".to_string();
        save_global_config(tmp.path(), &config).await.unwrap();
        assert_eq!(load_global_config(tmp.path()).await.ai.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_secrets_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_API_KEY", " AIza-test "),
            ("UNSPLASH_ACCESS_KEY", ""),
            ("CLOUDINARY_API_KEY", "123"),
        ]);
        let secrets = IntegrationSecrets::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(secrets.gemini_api_key.as_ref().unwrap().expose_secret(), "AIza-test");
        assert!(secrets.unsplash_access_key.is_none());
        // cloudinary needs both key and secret
        assert_eq!(secrets.configured(), vec!["gemini"]);
    }
}
