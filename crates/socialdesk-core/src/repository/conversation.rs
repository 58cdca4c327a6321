//! Inbox repository trait definition.

use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{AccountId, BrandId, ConversationId};
use socialdesk_types::inbox::{Conversation, ConversationKind, ConversationStatus, Message};

/// Filter criteria for listing conversations.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    pub kind: Option<ConversationKind>,
    pub account_id: Option<AccountId>,
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository trait for conversations and their messages.
pub trait ConversationRepository: Send + Sync {
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Find the conversation for a platform thread on a given account.
    fn find_by_thread(
        &self,
        account_id: &AccountId,
        external_thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List conversations of a brand, most recent activity first.
    fn list(
        &self,
        brand_id: &BrandId,
        filter: ConversationFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    fn update(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    fn add_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Whether a message with this platform id was already stored.
    fn message_exists(
        &self,
        conversation_id: &ConversationId,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Messages of a conversation in chronological order.
    fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
