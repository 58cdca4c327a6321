//! SQLite inbox repository (conversations and messages).

use socialdesk_core::repository::conversation::{ConversationFilter, ConversationRepository};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{AccountId, BrandId, ConversationId};
use socialdesk_types::inbox::{Conversation, Message};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{QueryBuilder, Row};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_enum, parse_id, query_err, write_err};

#[derive(Clone)]
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ConversationRow {
    id: String,
    brand_id: String,
    social_account_id: String,
    kind: String,
    external_thread_id: String,
    participant_handle: Option<String>,
    participant_name: Option<String>,
    status: String,
    unread_count: i64,
    last_message_at: String,
    last_message_preview: Option<String>,
    media_external_id: Option<String>,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            brand_id: row.try_get("brand_id")?,
            social_account_id: row.try_get("social_account_id")?,
            kind: row.try_get("kind")?,
            external_thread_id: row.try_get("external_thread_id")?,
            participant_handle: row.try_get("participant_handle")?,
            participant_name: row.try_get("participant_name")?,
            status: row.try_get("status")?,
            unread_count: row.try_get("unread_count")?,
            last_message_at: row.try_get("last_message_at")?,
            last_message_preview: row.try_get("last_message_preview")?,
            media_external_id: row.try_get("media_external_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_id(&self.id, "conversation")?,
            brand_id: parse_id(&self.brand_id, "brand")?,
            social_account_id: parse_id(&self.social_account_id, "account")?,
            kind: parse_enum(&self.kind)?,
            external_thread_id: self.external_thread_id,
            participant_handle: self.participant_handle,
            participant_name: self.participant_name,
            status: parse_enum(&self.status)?,
            unread_count: self.unread_count,
            last_message_at: parse_datetime(&self.last_message_at)?,
            last_message_preview: self.last_message_preview,
            media_external_id: self.media_external_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_conversation(row: &SqliteRow) -> Result<Conversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(query_err)?
        .into_conversation()
}

fn map_message(row: &SqliteRow) -> Result<Message, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let conversation_id: String = row.try_get("conversation_id").map_err(query_err)?;
    let direction: String = row.try_get("direction").map_err(query_err)?;
    let sent_at: String = row.try_get("sent_at").map_err(query_err)?;
    Ok(Message {
        id: parse_id(&id, "message")?,
        conversation_id: parse_id(&conversation_id, "conversation")?,
        direction: parse_enum(&direction)?,
        body: row.try_get("body").map_err(query_err)?,
        external_id: row.try_get("external_id").map_err(query_err)?,
        sender_handle: row.try_get("sender_handle").map_err(query_err)?,
        sent_at: parse_datetime(&sent_at)?,
    })
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            "INSERT INTO conversations (id, brand_id, social_account_id, kind, external_thread_id, participant_handle, participant_name, status, unread_count, last_message_at, last_message_preview, media_external_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.brand_id.to_string())
        .bind(conversation.social_account_id.to_string())
        .bind(conversation.kind.to_string())
        .bind(&conversation.external_thread_id)
        .bind(&conversation.participant_handle)
        .bind(&conversation.participant_name)
        .bind(conversation.status.to_string())
        .bind(conversation.unread_count)
        .bind(format_datetime(&conversation.last_message_at))
        .bind(&conversation.last_message_preview)
        .bind(&conversation.media_external_id)
        .bind(format_datetime(&conversation.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| write_err(e, || format!("thread '{}' already exists", conversation.external_thread_id)))?;

        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_conversation).transpose()
    }

    async fn find_by_thread(
        &self,
        account_id: &AccountId,
        external_thread_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE social_account_id = ? AND external_thread_id = ?")
            .bind(account_id.to_string())
            .bind(external_thread_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.as_ref().map(map_conversation).transpose()
    }

    async fn list(
        &self,
        brand_id: &BrandId,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM conversations WHERE brand_id = ");
        qb.push_bind(brand_id.to_string());
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind.to_string());
        }
        if let Some(account_id) = filter.account_id {
            qb.push(" AND social_account_id = ").push_bind(account_id.to_string());
        }
        if filter.unread_only {
            qb.push(" AND unread_count > 0");
        }
        qb.push(" ORDER BY last_message_at DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = filter.offset {
                qb.push(" OFFSET ").push_bind(offset);
            }
        }

        let rows = qb.build().fetch_all(&self.pool.reader).await.map_err(query_err)?;
        rows.iter().map(map_conversation).collect()
    }

    async fn update(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let result = sqlx::query(
            "UPDATE conversations SET participant_handle = ?, participant_name = ?, status = ?, unread_count = ?, last_message_at = ?, last_message_preview = ?, media_external_id = ?
             WHERE id = ?",
        )
        .bind(&conversation.participant_handle)
        .bind(&conversation.participant_name)
        .bind(conversation.status.to_string())
        .bind(conversation.unread_count)
        .bind(format_datetime(&conversation.last_message_at))
        .bind(&conversation.last_message_preview)
        .bind(&conversation.media_external_id)
        .bind(conversation.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(conversation.clone())
    }

    async fn add_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, direction, body, external_id, sender_handle, sent_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.direction.to_string())
        .bind(&message.body)
        .bind(&message.external_id)
        .bind(&message.sender_handle)
        .bind(format_datetime(&message.sent_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            write_err(e, || {
                format!("message '{}' already stored", message.external_id.as_deref().unwrap_or_default())
            })
        })?;

        Ok(message.clone())
    }

    async fn message_exists(
        &self,
        conversation_id: &ConversationId,
        external_id: &str,
    ) -> Result<bool, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ? AND external_id = ?")
                .bind(conversation_id.to_string())
                .bind(external_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn list_messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY sent_at ASC, id ASC")
            .bind(conversation_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        rows.iter().map(map_message).collect()
    }
}
