//! SQLite social account repository.
//!
//! Access tokens are sealed with the [`TokenVault`] before they reach the
//! database and opened again when rows are read.

use socialdesk_core::repository::account::AccountRepository;
use socialdesk_types::account::{Platform, SocialAccount};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{AccountId, BrandId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{
    format_datetime, parse_datetime, parse_enum, parse_id, parse_opt_datetime, query_err, write_err,
};
use crate::crypto::vault::TokenVault;

#[derive(Clone)]
pub struct SqliteAccountRepository {
    pool: DatabasePool,
    vault: TokenVault,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool, vault: TokenVault) -> Self {
        Self { pool, vault }
    }

    fn seal(&self, token: &str) -> Result<String, RepositoryError> {
        self.vault
            .seal(token)
            .map_err(|e| RepositoryError::Query(format!("token encryption: {e}")))
    }

    fn map_row(&self, row: &SqliteRow) -> Result<SocialAccount, RepositoryError> {
        let id: String = row.try_get("id").map_err(query_err)?;
        let brand_id: String = row.try_get("brand_id").map_err(query_err)?;
        let platform: String = row.try_get("platform").map_err(query_err)?;
        let status: String = row.try_get("status").map_err(query_err)?;
        let sealed: String = row.try_get("access_token_enc").map_err(query_err)?;
        let expires: Option<String> = row.try_get("token_expires_at").map_err(query_err)?;
        let connected_at: String = row.try_get("connected_at").map_err(query_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(query_err)?;

        let access_token = self
            .vault
            .open(&sealed)
            .map_err(|e| RepositoryError::Query(format!("token decryption for account {id}: {e}")))?;

        Ok(SocialAccount {
            id: parse_id(&id, "account")?,
            brand_id: parse_id(&brand_id, "brand")?,
            platform: parse_enum(&platform)?,
            handle: row.try_get("handle").map_err(query_err)?,
            external_id: row.try_get("external_id").map_err(query_err)?,
            display_name: row.try_get("display_name").map_err(query_err)?,
            access_token,
            token_expires_at: parse_opt_datetime(expires.as_deref())?,
            status: parse_enum(&status)?,
            connected_at: parse_datetime(&connected_at)?,
            updated_at: parse_datetime(&updated_at)?,
        })
    }

    fn map_rows(&self, rows: &[SqliteRow]) -> Result<Vec<SocialAccount>, RepositoryError> {
        rows.iter().map(|r| self.map_row(r)).collect()
    }
}

impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: &SocialAccount) -> Result<SocialAccount, RepositoryError> {
        let sealed = self.seal(&account.access_token)?;
        sqlx::query(
            "INSERT INTO social_accounts (id, brand_id, platform, handle, external_id, display_name, access_token_enc, token_expires_at, status, connected_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(account.brand_id.to_string())
        .bind(account.platform.to_string())
        .bind(&account.handle)
        .bind(&account.external_id)
        .bind(&account.display_name)
        .bind(sealed)
        .bind(account.token_expires_at.as_ref().map(format_datetime))
        .bind(account.status.to_string())
        .bind(format_datetime(&account.connected_at))
        .bind(format_datetime(&account.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            write_err(e, || format!("{}:{} is already connected", account.platform, account.external_id))
        })?;

        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<SocialAccount>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM social_accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(|r| self.map_row(r)).transpose()
    }

    async fn get_by_external_id(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<SocialAccount>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM social_accounts WHERE platform = ? AND external_id = ?")
            .bind(platform.to_string())
            .bind(external_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(|r| self.map_row(r)).transpose()
    }

    async fn list_by_brand(&self, brand_id: &BrandId) -> Result<Vec<SocialAccount>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM social_accounts WHERE brand_id = ? ORDER BY platform, handle")
            .bind(brand_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        self.map_rows(&rows)
    }

    async fn list_all(&self) -> Result<Vec<SocialAccount>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM social_accounts ORDER BY connected_at")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        self.map_rows(&rows)
    }

    async fn update(&self, account: &SocialAccount) -> Result<SocialAccount, RepositoryError> {
        let sealed = self.seal(&account.access_token)?;
        let result = sqlx::query(
            "UPDATE social_accounts SET handle = ?, display_name = ?, access_token_enc = ?, token_expires_at = ?, status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&account.handle)
        .bind(&account.display_name)
        .bind(sealed)
        .bind(account.token_expires_at.as_ref().map(format_datetime))
        .bind(account.status.to_string())
        .bind(format_datetime(&account.updated_at))
        .bind(account.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM social_accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use socialdesk_types::account::{AccountStatus, Platform, SocialAccount};
    use socialdesk_types::id::{AccountId, BrandId};

    use crate::crypto::vault::TokenVault;

    pub fn vault() -> TokenVault {
        TokenVault::new(&[7u8; 32])
    }

    pub fn account(brand_id: BrandId, platform: Platform, external_id: &str) -> SocialAccount {
        let now = Utc::now();
        SocialAccount {
            id: AccountId::new(),
            brand_id,
            platform,
            handle: format!("acme_{platform}"),
            external_id: external_id.to_string(),
            display_name: None,
            access_token: "EAAG-token".to_string(),
            token_expires_at: None,
            status: AccountStatus::Active,
            connected_at: now,
            updated_at: now,
        }
    }
}
