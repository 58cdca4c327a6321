//! SQLite media library and product catalog repositories.

use socialdesk_core::repository::media::{MediaFilter, MediaRepository, ProductRepository};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, MediaId, ProductId};
use socialdesk_types::media::{MediaAsset, Product};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_enum, parse_id, parse_list, query_err, to_json};

#[derive(Clone)]
pub struct SqliteMediaRepository {
    pool: DatabasePool,
}

impl SqliteMediaRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_asset(row: &SqliteRow) -> Result<MediaAsset, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> { row.try_get(col).map_err(query_err) };
    let dim = |col: &str| -> Result<Option<u32>, RepositoryError> {
        let v: Option<i64> = row.try_get(col).map_err(query_err)?;
        Ok(v.and_then(|v| u32::try_from(v).ok()))
    };
    let bytes: Option<i64> = row.try_get("bytes").map_err(query_err)?;

    Ok(MediaAsset {
        id: parse_id(&get("id")?, "media")?,
        brand_id: parse_id(&get("brand_id")?, "brand")?,
        url: get("url")?,
        public_id: row.try_get("public_id").map_err(query_err)?,
        kind: parse_enum(&get("kind")?)?,
        source: parse_enum(&get("source")?)?,
        width: dim("width")?,
        height: dim("height")?,
        bytes: bytes.and_then(|b| u64::try_from(b).ok()),
        alt_text: row.try_get("alt_text").map_err(query_err)?,
        attribution: row.try_get("attribution").map_err(query_err)?,
        tags: parse_list(&get("tags")?)?,
        created_at: parse_datetime(&get("created_at")?)?,
    })
}

impl MediaRepository for SqliteMediaRepository {
    async fn create(&self, asset: &MediaAsset) -> Result<MediaAsset, RepositoryError> {
        sqlx::query(
            "INSERT INTO media_assets (id, brand_id, url, public_id, kind, source, width, height, bytes, alt_text, attribution, tags, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(asset.id.to_string())
        .bind(asset.brand_id.to_string())
        .bind(&asset.url)
        .bind(&asset.public_id)
        .bind(asset.kind.to_string())
        .bind(asset.source.to_string())
        .bind(asset.width.map(i64::from))
        .bind(asset.height.map(i64::from))
        .bind(asset.bytes.and_then(|b| i64::try_from(b).ok()))
        .bind(&asset.alt_text)
        .bind(&asset.attribution)
        .bind(to_json(&asset.tags)?)
        .bind(format_datetime(&asset.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(asset.clone())
    }

    async fn get_by_id(&self, id: &MediaId) -> Result<Option<MediaAsset>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM media_assets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_asset).transpose()
    }

    async fn list(&self, brand_id: &BrandId, filter: MediaFilter) -> Result<Vec<MediaAsset>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM media_assets WHERE brand_id = ");
        qb.push_bind(brand_id.to_string());
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind.to_string());
        }
        if let Some(source) = filter.source {
            qb.push(" AND source = ").push_bind(source.to_string());
        }
        if let Some(tag) = filter.tag {
            qb.push(" AND EXISTS (SELECT 1 FROM json_each(media_assets.tags) WHERE json_each.value = ")
                .push_bind(tag.trim_start_matches('#').to_lowercase())
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = filter.offset {
                qb.push(" OFFSET ").push_bind(offset);
            }
        }

        let rows = qb.build().fetch_all(&self.pool.reader).await.map_err(query_err)?;
        rows.iter().map(map_asset).collect()
    }

    async fn delete(&self, id: &MediaId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM media_assets WHERE id = ?")
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

#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: DatabasePool,
}

impl SqliteProductRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> { row.try_get(col).map_err(query_err) };
    Ok(Product {
        id: parse_id(&get("id")?, "product")?,
        brand_id: parse_id(&get("brand_id")?, "brand")?,
        name: get("name")?,
        description: row.try_get("description").map_err(query_err)?,
        price_cents: row.try_get("price_cents").map_err(query_err)?,
        currency: get("currency")?,
        image_url: row.try_get("image_url").map_err(query_err)?,
        product_url: row.try_get("product_url").map_err(query_err)?,
        tags: parse_list(&get("tags")?)?,
        created_at: parse_datetime(&get("created_at")?)?,
        updated_at: parse_datetime(&get("updated_at")?)?,
    })
}

impl ProductRepository for SqliteProductRepository {
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError> {
        sqlx::query(
            "INSERT INTO products (id, brand_id, name, description, price_cents, currency, image_url, product_url, tags, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(product.brand_id.to_string())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(&product.image_url)
        .bind(&product.product_url)
        .bind(to_json(&product.tags)?)
        .bind(format_datetime(&product.created_at))
        .bind(format_datetime(&product.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(product.clone())
    }

    async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_product).transpose()
    }

    async fn list(&self, brand_id: &BrandId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM products WHERE brand_id = ? ORDER BY name COLLATE NOCASE ASC")
            .bind(brand_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(map_product).collect()
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, description = ?, price_cents = ?, currency = ?, image_url = ?, product_url = ?, tags = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(&product.image_url)
        .bind(&product.product_url)
        .bind(to_json(&product.tags)?)
        .bind(format_datetime(&product.updated_at))
        .bind(product.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
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
