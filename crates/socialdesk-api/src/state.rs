//! Application state shared by CLI commands and HTTP handlers.
//!
//! `AppState` wires concrete SQLite repositories and HTTP clients into the
//! generic core services. Integrations without credentials are wired as
//! `None` and report "not configured" when used.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use socialdesk_core::scheduler::ScheduledPublisher;
use socialdesk_core::service::account::AccountService;
use socialdesk_core::service::brand::BrandService;
use socialdesk_core::service::calendar::CalendarService;
use socialdesk_core::service::content::ContentService;
use socialdesk_core::service::inbox::InboxService;
use socialdesk_core::service::media::{MediaService, SlideSize};
use socialdesk_core::service::post::PostService;
use socialdesk_core::service::product::ProductService;
use socialdesk_core::service::publish::PublishService;
use socialdesk_infra::config::{self, IntegrationSecrets};
use socialdesk_infra::crypto::vault::TokenVault;
use socialdesk_infra::gemini::GeminiClient;
use socialdesk_infra::media::{CloudinaryStore, HttpMediaFetcher, ImageSlideRenderer, UnsplashClient};
use socialdesk_infra::meta::MetaGraphClient;
use socialdesk_infra::sqlite::account::SqliteAccountRepository;
use socialdesk_infra::sqlite::api_key::SqliteApiKeyStore;
use socialdesk_infra::sqlite::brand::{SqliteBrandRepository, SqliteUserRepository};
use socialdesk_infra::sqlite::conversation::SqliteConversationRepository;
use socialdesk_infra::sqlite::media::{SqliteMediaRepository, SqliteProductRepository};
use socialdesk_infra::sqlite::pool::DatabasePool;
use socialdesk_infra::sqlite::post::SqlitePostRepository;
use socialdesk_types::config::GlobalConfig;
use socialdesk_types::content::GenerationOptions;

/// Derives the vault key from a passphrase instead of `vault.key`.
pub const VAULT_PASSPHRASE_ENV: &str = "SOCIALDESK_VAULT_PASSPHRASE";

pub type AppBrandService = BrandService<SqliteBrandRepository, SqliteUserRepository>;
pub type AppAccountService = AccountService<SqliteAccountRepository>;
pub type AppPostService = PostService<SqlitePostRepository, SqliteAccountRepository, SqliteBrandRepository>;
pub type AppPublishService =
    PublishService<SqlitePostRepository, SqliteAccountRepository, SqliteBrandRepository, MetaGraphClient>;
pub type AppCalendarService = CalendarService<SqlitePostRepository, SqliteBrandRepository>;
pub type AppInboxService = InboxService<SqliteConversationRepository, SqliteAccountRepository, MetaGraphClient>;
pub type AppContentService = ContentService<Option<GeminiClient>, ImageSlideRenderer>;
pub type AppMediaService = MediaService<
    SqliteMediaRepository,
    Option<CloudinaryStore>,
    Option<UnsplashClient>,
    HttpMediaFetcher,
    ImageSlideRenderer,
>;
pub type AppProductService = ProductService<SqliteProductRepository>;
pub type AppScheduler =
    ScheduledPublisher<SqlitePostRepository, SqliteAccountRepository, SqliteBrandRepository, MetaGraphClient>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub brand_service: Arc<AppBrandService>,
    pub account_service: Arc<AppAccountService>,
    pub post_service: Arc<AppPostService>,
    pub publish_service: Arc<AppPublishService>,
    pub calendar_service: Arc<AppCalendarService>,
    pub inbox_service: Arc<AppInboxService>,
    pub content_service: Arc<AppContentService>,
    pub media_service: Arc<AppMediaService>,
    pub product_service: Arc<AppProductService>,
    pub api_keys: SqliteApiKeyStore,
    pub config: Arc<GlobalConfig>,
    pub webhook: Arc<WebhookSecrets>,
    /// Integrations with credentials, for `sdesk status` and `/health`.
    pub integrations: Vec<&'static str>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

/// Credentials for the Meta webhook endpoint.
pub struct WebhookSecrets {
    pub app_secret: Option<SecretString>,
    pub verify_token: Option<SecretString>,
}

impl AppState {
    /// Initialize from the resolved data directory and the environment.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = config::data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let global = config::load_global_config(&data_dir).await;
        let secrets = IntegrationSecrets::from_env();
        let vault = match std::env::var(VAULT_PASSPHRASE_ENV) {
            Ok(passphrase) if !passphrase.is_empty() => TokenVault::from_password(&passphrase)?,
            _ => TokenVault::open_in(&data_dir)?,
        };
        let db_pool = DatabasePool::open_in(&data_dir).await?;

        Ok(Self::build(data_dir, db_pool, vault, global, secrets))
    }

    /// Wire services over an open pool.
    pub fn build(
        data_dir: PathBuf,
        db_pool: DatabasePool,
        vault: TokenVault,
        global: GlobalConfig,
        secrets: IntegrationSecrets,
    ) -> Self {
        let integrations = secrets.configured();

        let brands = SqliteBrandRepository::new(db_pool.clone());
        let users = SqliteUserRepository::new(db_pool.clone());
        let accounts = SqliteAccountRepository::new(db_pool.clone(), vault);
        let posts = SqlitePostRepository::new(db_pool.clone());
        let conversations = SqliteConversationRepository::new(db_pool.clone());
        let assets = SqliteMediaRepository::new(db_pool.clone());
        let products = SqliteProductRepository::new(db_pool.clone());

        let meta = MetaGraphClient::new(&global.publishing);
        let gemini = secrets
            .gemini_api_key
            .map(|key| GeminiClient::new(key, &global.ai));
        let cloudinary = match (
            global.media.cloudinary_cloud_name.clone(),
            secrets.cloudinary_api_key,
            secrets.cloudinary_api_secret,
        ) {
            (Some(cloud), Some(key), Some(secret)) => Some(CloudinaryStore::new(cloud, key, secret)),
            _ => None,
        };
        let unsplash = secrets.unsplash_access_key.map(UnsplashClient::new);
        let renderer = Arc::new(ImageSlideRenderer::from_optional_font(
            global.media.font_path.as_deref().map(std::path::Path::new),
        ));

        let options = GenerationOptions {
            temperature: global.ai.temperature,
            max_output_tokens: global.ai.max_output_tokens,
        };
        let slide_size = SlideSize {
            width: global.media.slide_width,
            height: global.media.slide_height,
        };

        let state = Self {
            brand_service: Arc::new(BrandService::new(brands.clone(), users)),
            account_service: Arc::new(AccountService::new(accounts.clone())),
            post_service: Arc::new(PostService::new(posts.clone(), accounts.clone(), brands.clone())),
            publish_service: Arc::new(PublishService::new(
                posts.clone(),
                accounts.clone(),
                brands.clone(),
                meta.clone(),
            )),
            calendar_service: Arc::new(CalendarService::new(posts, brands)),
            inbox_service: Arc::new(InboxService::new(conversations, accounts, meta)),
            content_service: Arc::new(ContentService::new(
                gemini,
                renderer.clone(),
                options,
                (slide_size.width, slide_size.height),
            )),
            media_service: Arc::new(MediaService::new(
                assets,
                cloudinary,
                unsplash,
                HttpMediaFetcher::new(),
                renderer,
                global.media.cloudinary_folder.clone(),
                slide_size,
            )),
            product_service: Arc::new(ProductService::new(products)),
            api_keys: SqliteApiKeyStore::new(db_pool.clone()),
            config: Arc::new(global),
            webhook: Arc::new(WebhookSecrets {
                app_secret: secrets.meta_app_secret,
                verify_token: secrets.meta_verify_token,
            }),
            integrations,
            data_dir,
            db_pool,
        };
        tracing::debug!(integrations = ?state.integrations, "application state ready");
        state
    }

    /// Background publisher configured from `[scheduler]`.
    pub fn scheduler(&self) -> AppScheduler {
        let cfg = &self.config.scheduler;
        ScheduledPublisher::new(
            self.publish_service.clone(),
            Duration::from_secs(cfg.tick_interval_secs.max(1)),
            cfg.batch_size,
        )
    }
}

#[cfg(test)]
pub(crate) async fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open_in(dir.path()).await.unwrap();
    let state = AppState::build(
        dir.path().to_path_buf(),
        pool,
        TokenVault::new(&[7u8; 32]),
        GlobalConfig::default(),
        IntegrationSecrets::default(),
    );
    (state, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_without_integrations() {
        let (state, _dir) = test_state().await;
        assert!(state.integrations.is_empty());
        assert!(state.webhook.app_secret.is_none());
        assert!(state.brand_service.list().await.unwrap().is_empty());
    }
}
