//! SQLite post repository.
//!
//! A post row and its `post_items` rows are always written in one
//! transaction and read back together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use socialdesk_core::repository::SortOrder;
use socialdesk_core::repository::post::{PostFilter, PostRepository};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, PostId};
use socialdesk_types::post::{Post, PostItem, PostStatus};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::pool::DatabasePool;
use super::{
    format_datetime, parse_datetime, parse_enum, parse_id, parse_list, parse_opt_datetime, query_err,
    to_json,
};

#[derive(Clone)]
pub struct SqlitePostRepository {
    pool: DatabasePool,
}

impl SqlitePostRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Load items for the given post rows and assemble full posts, keeping
    /// the order of `rows`.
    async fn hydrate(&self, rows: &[SqliteRow]) -> Result<Vec<Post>, RepositoryError> {
        let mut posts = rows.iter().map(map_post).collect::<Result<Vec<_>, _>>()?;
        if posts.is_empty() {
            return Ok(posts);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM post_items WHERE post_id IN (");
        let mut ids = qb.separated(", ");
        for post in &posts {
            ids.push_bind(post.id.to_string());
        }
        qb.push(") ORDER BY post_id, position");

        let item_rows = qb
            .build()
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut by_post: HashMap<PostId, Vec<PostItem>> = HashMap::new();
        for row in &item_rows {
            let item = map_item(row)?;
            by_post.entry(item.post_id).or_default().push(item);
        }
        for post in &mut posts {
            post.items = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }

    async fn insert_items(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        items: &[PostItem],
    ) -> Result<(), RepositoryError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_items (id, post_id, social_account_id, platform, content, media_urls, hashtags, media_type, status, external_id, permalink, error, published_at, position)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(item.id.to_string())
            .bind(item.post_id.to_string())
            .bind(item.social_account_id.to_string())
            .bind(item.platform.to_string())
            .bind(&item.content)
            .bind(to_json(&item.media_urls)?)
            .bind(to_json(&item.hashtags)?)
            .bind(item.media_type.to_string())
            .bind(item.status.to_string())
            .bind(&item.external_id)
            .bind(&item.permalink)
            .bind(&item.error)
            .bind(item.published_at.as_ref().map(format_datetime))
            .bind(position as i64)
            .execute(&mut **tx)
            .await
            .map_err(query_err)?;
        }
        Ok(())
    }
}

fn map_post(row: &SqliteRow) -> Result<Post, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> { row.try_get(col).map_err(query_err) };
    let get_opt =
        |col: &str| -> Result<Option<String>, RepositoryError> { row.try_get(col).map_err(query_err) };

    Ok(Post {
        id: parse_id(&get("id")?, "post")?,
        brand_id: parse_id(&get("brand_id")?, "brand")?,
        title: get_opt("title")?,
        content: get("content")?,
        media_urls: parse_list(&get("media_urls")?)?,
        hashtags: parse_list(&get("hashtags")?)?,
        status: parse_enum(&get("status")?)?,
        scheduled_at: parse_opt_datetime(get_opt("scheduled_at")?.as_deref())?,
        published_at: parse_opt_datetime(get_opt("published_at")?.as_deref())?,
        created_by: get_opt("created_by")?
            .map(|id| parse_id(&id, "user"))
            .transpose()?,
        review_note: get_opt("review_note")?,
        reviewed_by: get_opt("reviewed_by")?
            .map(|id| parse_id(&id, "user"))
            .transpose()?,
        items: Vec::new(),
        created_at: parse_datetime(&get("created_at")?)?,
        updated_at: parse_datetime(&get("updated_at")?)?,
    })
}

fn map_item(row: &SqliteRow) -> Result<PostItem, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> { row.try_get(col).map_err(query_err) };
    let get_opt =
        |col: &str| -> Result<Option<String>, RepositoryError> { row.try_get(col).map_err(query_err) };

    Ok(PostItem {
        id: parse_id(&get("id")?, "post item")?,
        post_id: parse_id(&get("post_id")?, "post")?,
        social_account_id: parse_id(&get("social_account_id")?, "account")?,
        platform: parse_enum(&get("platform")?)?,
        content: get("content")?,
        media_urls: parse_list(&get("media_urls")?)?,
        hashtags: parse_list(&get("hashtags")?)?,
        media_type: parse_enum(&get("media_type")?)?,
        status: parse_enum(&get("status")?)?,
        external_id: get_opt("external_id")?,
        permalink: get_opt("permalink")?,
        error: get_opt("error")?,
        published_at: parse_opt_datetime(get_opt("published_at")?.as_deref())?,
    })
}

impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: &Post) -> Result<Post, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO posts (id, brand_id, title, content, media_urls, hashtags, status, scheduled_at, published_at, created_by, review_note, reviewed_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id.to_string())
        .bind(post.brand_id.to_string())
        .bind(&post.title)
        .bind(&post.content)
        .bind(to_json(&post.media_urls)?)
        .bind(to_json(&post.hashtags)?)
        .bind(post.status.as_str())
        .bind(post.scheduled_at.as_ref().map(format_datetime))
        .bind(post.published_at.as_ref().map(format_datetime))
        .bind(post.created_by.map(|id| id.to_string()))
        .bind(&post.review_note)
        .bind(post.reviewed_by.map(|id| id.to_string()))
        .bind(format_datetime(&post.created_at))
        .bind(format_datetime(&post.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        Self::insert_items(&mut tx, &post.items).await?;
        tx.commit().await.map_err(query_err)?;

        tracing::debug!(post_id = %post.id, items = post.items.len(), "inserted post");
        Ok(post.clone())
    }

    async fn get_by_id(&self, id: &PostId) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        match row {
            Some(row) => Ok(self.hydrate(std::slice::from_ref(&row)).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, brand_id: &BrandId, filter: PostFilter) -> Result<Vec<Post>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM posts WHERE brand_id = ");
        qb.push_bind(brand_id.to_string());
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        // Whitelisted: the column name is interpolated.
        let sort_field = match filter.sort_by.as_deref() {
            Some(f @ ("created_at" | "scheduled_at" | "updated_at" | "published_at")) => f,
            _ => "created_at",
        };
        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        qb.push(format!(" ORDER BY {sort_field} {order}, id {order}"));

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = filter.offset {
                qb.push(" OFFSET ").push_bind(offset);
            }
        }

        let rows = qb.build().fetch_all(&self.pool.reader).await.map_err(query_err)?;
        self.hydrate(&rows).await
    }

    async fn update(&self, post: &Post) -> Result<Post, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, media_urls = ?, hashtags = ?, status = ?, scheduled_at = ?, published_at = ?, review_note = ?, reviewed_by = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(to_json(&post.media_urls)?)
        .bind(to_json(&post.hashtags)?)
        .bind(post.status.as_str())
        .bind(post.scheduled_at.as_ref().map(format_datetime))
        .bind(post.published_at.as_ref().map(format_datetime))
        .bind(&post.review_note)
        .bind(post.reviewed_by.map(|id| id.to_string()))
        .bind(format_datetime(&post.updated_at))
        .bind(post.id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM post_items WHERE post_id = ?")
            .bind(post.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        Self::insert_items(&mut tx, &post.items).await?;
        tx.commit().await.map_err(query_err)?;

        Ok(post.clone())
    }

    async fn update_item(&self, item: &PostItem) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE post_items SET content = ?, media_urls = ?, hashtags = ?, media_type = ?, status = ?, external_id = ?, permalink = ?, error = ?, published_at = ?
             WHERE id = ?",
        )
        .bind(&item.content)
        .bind(to_json(&item.media_urls)?)
        .bind(to_json(&item.hashtags)?)
        .bind(item.media_type.to_string())
        .bind(item.status.to_string())
        .bind(&item.external_id)
        .bind(&item.permalink)
        .bind(&item.error)
        .bind(item.published_at.as_ref().map(format_datetime))
        .bind(item.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        id: &PostId,
        expected: PostStatus,
        next: PostStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE posts SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(format_datetime(&Utc::now()))
            .bind(id.to_string())
            .bind(expected.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Post>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM posts WHERE status = ? AND scheduled_at IS NOT NULL AND scheduled_at <= ?
             ORDER BY scheduled_at ASC LIMIT ?",
        )
        .bind(PostStatus::Scheduled.as_str())
        .bind(format_datetime(&now))
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        self.hydrate(&rows).await
    }

    async fn list_in_range(
        &self,
        brand_id: &BrandId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Post>, RepositoryError> {
        let (from, to) = (format_datetime(&from), format_datetime(&to));
        let rows = sqlx::query(
            "SELECT * FROM posts WHERE brand_id = ?
               AND ((scheduled_at >= ? AND scheduled_at < ?) OR (published_at >= ? AND published_at < ?))
             ORDER BY COALESCE(published_at, scheduled_at) ASC",
        )
        .bind(brand_id.to_string())
        .bind(&from)
        .bind(&to)
        .bind(&from)
        .bind(&to)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        self.hydrate(&rows).await
    }
}
