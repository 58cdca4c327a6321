//! API key storage.
//!
//! Keys look like `sdk_<64 hex>`. Only the SHA-256 hash is stored; the
//! plaintext is returned once from [`SqliteApiKeyStore::issue`].

use chrono::Utc;
use socialdesk_types::brand::{ApiKeyInfo, AuthContext, User};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::BrandId;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_enum, parse_id, parse_opt_datetime, query_err};
use crate::crypto::hash::sha256_hex;
use crate::crypto::vault::{hex_encode, rand_bytes};

pub const KEY_PREFIX: &str = "sdk_";

/// Characters of the plaintext key kept for display (`sdk_` plus 8).
const DISPLAY_PREFIX_LEN: usize = 12;

pub fn hash_api_key(key: &str) -> String {
    sha256_hex(key.as_bytes())
}

pub fn generate_api_key() -> String {
    format!("{KEY_PREFIX}{}", hex_encode(&rand_bytes()))
}

#[derive(Clone)]
pub struct SqliteApiKeyStore {
    pool: DatabasePool,
}

fn map_info(row: &SqliteRow) -> Result<ApiKeyInfo, RepositoryError> {
    let user_id: String = row.try_get("user_id").map_err(query_err)?;
    let brand_id: String = row.try_get("brand_id").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    let last_used_at: Option<String> = row.try_get("last_used_at").map_err(query_err)?;
    Ok(ApiKeyInfo {
        prefix: row.try_get("prefix").map_err(query_err)?,
        user_id: parse_id(&user_id, "user")?,
        brand_id: parse_id(&brand_id, "brand")?,
        label: row.try_get("label").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
        last_used_at: parse_opt_datetime(last_used_at.as_deref())?,
    })
}

impl SqliteApiKeyStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create a key acting as `user`. Returns the plaintext key and its metadata.
    pub async fn issue(&self, user: &User, label: Option<&str>) -> Result<(String, ApiKeyInfo), RepositoryError> {
        let key = generate_api_key();
        let info = ApiKeyInfo {
            prefix: key[..DISPLAY_PREFIX_LEN].to_string(),
            user_id: user.id,
            brand_id: user.brand_id,
            label: label.map(str::to_string),
            created_at: Utc::now(),
            last_used_at: None,
        };

        sqlx::query("INSERT INTO api_keys (key_hash, prefix, user_id, label, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(hash_api_key(&key))
            .bind(&info.prefix)
            .bind(user.id.to_string())
            .bind(&info.label)
            .bind(format_datetime(&info.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        tracing::info!(user_id = %user.id, prefix = %info.prefix, "issued api key");
        Ok((key, info))
    }

    /// Resolve a plaintext key to the acting user. Touches `last_used_at`
    /// on success; a failure to record usage does not fail authentication.
    pub async fn authenticate(&self, key: &str) -> Result<Option<AuthContext>, RepositoryError> {
        if !key.starts_with(KEY_PREFIX) {
            return Ok(None);
        }
        let key_hash = hash_api_key(key);
        let row = sqlx::query(
            "SELECT u.id AS user_id, u.brand_id AS brand_id, u.role AS role
             FROM api_keys k JOIN users u ON u.id = k.user_id
             WHERE k.key_hash = ?",
        )
        .bind(&key_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row.try_get("user_id").map_err(query_err)?;
        let brand_id: String = row.try_get("brand_id").map_err(query_err)?;
        let role: String = row.try_get("role").map_err(query_err)?;

        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE key_hash = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(&key_hash)
            .execute(&self.pool.writer)
            .await
        {
            tracing::warn!(error = %e, "failed to record api key usage");
        }

        Ok(Some(AuthContext {
            user_id: parse_id(&user_id, "user")?,
            brand_id: parse_id::<BrandId>(&brand_id, "brand")?,
            role: parse_enum(&role)?,
        }))
    }

    pub async fn list(&self, brand_id: &BrandId) -> Result<Vec<ApiKeyInfo>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT k.prefix, k.user_id, u.brand_id, k.label, k.created_at, k.last_used_at
             FROM api_keys k JOIN users u ON u.id = k.user_id
             WHERE u.brand_id = ? ORDER BY k.created_at",
        )
        .bind(brand_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        rows.iter().map(map_info).collect()
    }

    /// Revoke a key of `brand_id` by its display prefix.
    pub async fn revoke(&self, brand_id: &BrandId, prefix: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM api_keys WHERE prefix = ?
               AND user_id IN (SELECT id FROM users WHERE brand_id = ?)",
        )
        .bind(prefix)
        .bind(brand_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
