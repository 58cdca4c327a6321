//! SQLite brand and team member repositories.

use socialdesk_core::repository::brand::{BrandRepository, UserRepository};
use socialdesk_types::brand::{Brand, User};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_enum, parse_id, query_err, write_err};

/// SQLite-backed implementation of `BrandRepository`.
#[derive(Clone)]
pub struct SqliteBrandRepository {
    pool: DatabasePool,
}

impl SqliteBrandRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct BrandRow {
    id: String,
    slug: String,
    name: String,
    industry: Option<String>,
    website: Option<String>,
    requires_approval: bool,
    created_at: String,
    updated_at: String,
}

impl BrandRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            name: row.try_get("name")?,
            industry: row.try_get("industry")?,
            website: row.try_get("website")?,
            requires_approval: row.try_get("requires_approval")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_brand(self) -> Result<Brand, RepositoryError> {
        Ok(Brand {
            id: parse_id(&self.id, "brand")?,
            slug: self.slug,
            name: self.name,
            industry: self.industry,
            website: self.website,
            requires_approval: self.requires_approval,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_brand(row: &SqliteRow) -> Result<Brand, RepositoryError> {
    BrandRow::from_row(row).map_err(query_err)?.into_brand()
}

impl BrandRepository for SqliteBrandRepository {
    async fn create(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        sqlx::query(
            "INSERT INTO brands (id, slug, name, industry, website, requires_approval, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(brand.id.to_string())
        .bind(&brand.slug)
        .bind(&brand.name)
        .bind(&brand.industry)
        .bind(&brand.website)
        .bind(brand.requires_approval)
        .bind(format_datetime(&brand.created_at))
        .bind(format_datetime(&brand.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || format!("brand with slug '{}' already exists", brand.slug)))?;

        Ok(brand.clone())
    }

    async fn get_by_id(&self, id: &BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM brands WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_brand).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM brands WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_brand).transpose()
    }

    async fn list(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM brands ORDER BY name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(map_brand).collect()
    }

    async fn update(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        let result = sqlx::query(
            "UPDATE brands SET slug = ?, name = ?, industry = ?, website = ?, requires_approval = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&brand.slug)
        .bind(&brand.name)
        .bind(&brand.industry)
        .bind(&brand.website)
        .bind(brand.requires_approval)
        .bind(format_datetime(&brand.updated_at))
        .bind(brand.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || format!("brand with slug '{}' already exists", brand.slug)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(brand.clone())
    }
}

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let brand_id: String = row.try_get("brand_id").map_err(query_err)?;
    let role: String = row.try_get("role").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    Ok(User {
        id: parse_id(&id, "user")?,
        brand_id: parse_id(&brand_id, "brand")?,
        email: row.try_get("email").map_err(query_err)?,
        name: row.try_get("name").map_err(query_err)?,
        role: parse_enum(&role)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, brand_id, email, name, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(user.brand_id.to_string())
        .bind(user.email.to_lowercase())
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || format!("user '{}' already exists", user.email)))?;

        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_user).transpose()
    }

    async fn get_by_email(&self, brand_id: &BrandId, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE brand_id = ? AND email = ?")
            .bind(brand_id.to_string())
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_user).transpose()
    }

    async fn list_by_brand(&self, brand_id: &BrandId) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users WHERE brand_id = ? ORDER BY created_at ASC")
            .bind(brand_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(map_user).collect()
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
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
    use socialdesk_types::brand::{Brand, User, UserRole, slugify};
    use socialdesk_types::id::{BrandId, UserId};

    pub fn brand(name: &str) -> Brand {
        let now = Utc::now();
        Brand {
            id: BrandId::new(),
            slug: slugify(name),
            name: name.to_string(),
            industry: Some("Food & Drink".to_string()),
            website: None,
            requires_approval: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user(brand_id: BrandId, email: &str, role: UserRole) -> User {
        User {
            id: UserId::new(),
            brand_id,
            email: email.to_string(),
            name: "Maya".to_string(),
            role,
            created_at: Utc::now(),
        }
    }
}
