//! Connected social accounts.

use chrono::{DateTime, Utc};

use socialdesk_types::account::{AccountStatus, ConnectAccountRequest, SocialAccount};
use socialdesk_types::error::{AccountError, RepositoryError};
use socialdesk_types::id::{AccountId, BrandId};

use crate::repository::account::AccountRepository;

fn storage(e: RepositoryError) -> AccountError {
    AccountError::StorageError(e.to_string())
}

pub struct AccountService<A: AccountRepository> {
    accounts: A,
}

impl<A: AccountRepository> AccountService<A> {
    pub fn new(accounts: A) -> Self {
        Self { accounts }
    }

    /// Connect an account, or refresh the token of one this brand already
    /// connected. A platform account belongs to at most one brand.
    pub async fn connect(
        &self,
        brand_id: &BrandId,
        request: ConnectAccountRequest,
    ) -> Result<SocialAccount, AccountError> {
        let handle = request.handle.trim().trim_start_matches('@').to_string();
        let external_id = request.external_id.trim().to_string();
        if handle.is_empty() || external_id.is_empty() {
            return Err(AccountError::Invalid("handle and platform id are required".to_string()));
        }
        if request.access_token.trim().is_empty() {
            return Err(AccountError::Invalid("access token is required".to_string()));
        }
        let now = Utc::now();
        if request.token_expires_at.is_some_and(|exp| exp <= now) {
            return Err(AccountError::Invalid("access token is already expired".to_string()));
        }

        let existing = self
            .accounts
            .get_by_external_id(request.platform, &external_id)
            .await
            .map_err(storage)?;
        if let Some(mut account) = existing {
            if account.brand_id != *brand_id {
                return Err(AccountError::AlreadyConnected(format!(
                    "{}:@{}",
                    account.platform, account.handle
                )));
            }
            account.handle = handle;
            account.display_name = request.display_name.or(account.display_name);
            account.access_token = request.access_token;
            account.token_expires_at = request.token_expires_at;
            account.status = AccountStatus::Active;
            account.updated_at = now;
            let account = self.accounts.update(&account).await.map_err(storage)?;
            tracing::info!(account_id = %account.id, platform = %account.platform, "reconnected account");
            return Ok(account);
        }

        let account = SocialAccount {
            id: AccountId::new(),
            brand_id: *brand_id,
            platform: request.platform,
            handle,
            external_id,
            display_name: request.display_name,
            access_token: request.access_token,
            token_expires_at: request.token_expires_at,
            status: AccountStatus::Active,
            connected_at: now,
            updated_at: now,
        };
        let account = self.accounts.create(&account).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => AccountError::AlreadyConnected(msg),
            other => storage(other),
        })?;
        tracing::info!(account_id = %account.id, platform = %account.platform, handle = %account.handle, "connected account");
        Ok(account)
    }

    pub async fn list(&self, brand_id: &BrandId) -> Result<Vec<SocialAccount>, AccountError> {
        self.accounts.list_by_brand(brand_id).await.map_err(storage)
    }

    pub async fn get(&self, brand_id: &BrandId, id: &AccountId) -> Result<SocialAccount, AccountError> {
        self.accounts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|a| a.brand_id == *brand_id)
            .ok_or(AccountError::NotFound)
    }

    /// Mark an account disconnected and drop its token. The row is kept so
    /// published posts still reference it.
    pub async fn disconnect(&self, brand_id: &BrandId, id: &AccountId) -> Result<SocialAccount, AccountError> {
        let mut account = self.get(brand_id, id).await?;
        account.status = AccountStatus::Disconnected;
        account.access_token.clear();
        account.updated_at = Utc::now();
        let account = self.accounts.update(&account).await.map_err(storage)?;
        tracing::info!(account_id = %id, "disconnected account");
        Ok(account)
    }

    /// Flag active accounts whose token has expired. Returns how many changed.
    pub async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<usize, AccountError> {
        let accounts = self.accounts.list_all().await.map_err(storage)?;
        let mut changed = 0;
        for mut account in accounts {
            if account.status == AccountStatus::Active && account.token_expired(now) {
                account.status = AccountStatus::Expired;
                account.updated_at = now;
                self.accounts.update(&account).await.map_err(storage)?;
                tracing::warn!(account_id = %account.id, handle = %account.handle, "access token expired");
                changed += 1;
            }
        }
        Ok(changed)
    }
}
