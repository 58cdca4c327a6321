//! Unified inbox: direct messages, comments, and mentions across accounts.

use chrono::Utc;
use serde::Serialize;

use socialdesk_types::error::{InboxError, RepositoryError};
use socialdesk_types::id::{AccountId, BrandId, ConversationId, MessageId};
use socialdesk_types::inbox::{
    Conversation, ConversationKind, ConversationStatus, InboundEvent, Message, MessageDirection,
    preview,
};

use crate::ai::generator::ContentGenerator;
use crate::platform::publisher::{ReplyTarget, SocialPublisher};
use crate::repository::account::AccountRepository;
use crate::repository::conversation::{ConversationFilter, ConversationRepository};
use crate::service::Actor;
use crate::service::content::ContentService;
use crate::service::storage::SlideRenderer;

fn storage(e: RepositoryError) -> InboxError {
    InboxError::StorageError(e.to_string())
}

/// What `ingest` did with an event.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// Message appended to this conversation.
    Stored(Conversation),
    /// A message with the same platform id already exists.
    Duplicate,
    /// Event generated by the account itself (our own reply echoed back).
    Ignored,
}

/// Result of a comment sync.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub stored: usize,
}

/// A conversation with its messages, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

pub struct InboxService<C: ConversationRepository, A: AccountRepository, S: SocialPublisher> {
    conversations: C,
    accounts: A,
    publisher: S,
}

impl<C: ConversationRepository, A: AccountRepository, S: SocialPublisher> InboxService<C, A, S> {
    pub fn new(conversations: C, accounts: A, publisher: S) -> Self {
        Self {
            conversations,
            accounts,
            publisher,
        }
    }

    /// Record an inbound platform event.
    ///
    /// Threads are keyed by `(account, thread id)`. A new message on a
    /// Pending, Resolved, or Archived thread puts it back to Open.
    pub async fn ingest(&self, event: InboundEvent) -> Result<IngestOutcome, InboxError> {
        let account = self
            .accounts
            .get_by_external_id(event.platform, &event.account_external_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| InboxError::UnknownAccount(event.account_external_id.clone()))?;

        if event.sender_id.as_deref() == Some(account.external_id.as_str()) {
            tracing::debug!(account_id = %account.id, thread = %event.thread_id, "ignoring own message");
            return Ok(IngestOutcome::Ignored);
        }

        let existing = self
            .conversations
            .find_by_thread(&account.id, &event.thread_id)
            .await
            .map_err(storage)?;
        let mut conversation = match existing {
            Some(c) => c,
            None => {
                let conversation = Conversation {
                    id: ConversationId::new(),
                    brand_id: account.brand_id,
                    social_account_id: account.id,
                    kind: event.kind,
                    external_thread_id: event.thread_id.clone(),
                    participant_handle: event.sender_handle.clone(),
                    participant_name: None,
                    status: ConversationStatus::Open,
                    unread_count: 0,
                    last_message_at: event.timestamp,
                    last_message_preview: None,
                    media_external_id: event.media_external_id.clone(),
                    created_at: Utc::now(),
                };
                let created = self
                    .conversations
                    .create(&conversation)
                    .await
                    .map_err(storage)?;
                tracing::info!(
                    conversation_id = %created.id,
                    kind = %created.kind,
                    account_id = %account.id,
                    "new conversation"
                );
                created
            }
        };

        if let Some(external_id) = &event.external_message_id
            && self
                .conversations
                .message_exists(&conversation.id, external_id)
                .await
                .map_err(storage)?
        {
            return Ok(IngestOutcome::Duplicate);
        }

        let message = Message {
            id: MessageId::new(),
            conversation_id: conversation.id,
            direction: MessageDirection::Inbound,
            body: event.text.clone(),
            external_id: event.external_message_id.clone(),
            sender_handle: event.sender_handle.clone(),
            sent_at: event.timestamp,
        };
        self.conversations
            .add_message(&message)
            .await
            .map_err(storage)?;

        conversation.unread_count += 1;
        if event.timestamp >= conversation.last_message_at || conversation.last_message_preview.is_none() {
            conversation.last_message_at = event.timestamp;
            conversation.last_message_preview = Some(preview(&event.text));
        }
        if conversation.participant_handle.is_none() {
            conversation.participant_handle = event.sender_handle.clone();
        }
        if conversation.media_external_id.is_none() {
            conversation.media_external_id = event.media_external_id.clone();
        }
        if conversation.status != ConversationStatus::Open {
            tracing::debug!(conversation_id = %conversation.id, from = %conversation.status, "reopening conversation");
            conversation.status = ConversationStatus::Open;
        }

        let conversation = self
            .conversations
            .update(&conversation)
            .await
            .map_err(storage)?;
        Ok(IngestOutcome::Stored(conversation))
    }

    pub async fn list(
        &self,
        brand_id: &BrandId,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, InboxError> {
        self.conversations
            .list(brand_id, filter)
            .await
            .map_err(storage)
    }

    async fn get(&self, brand_id: &BrandId, id: &ConversationId) -> Result<Conversation, InboxError> {
        self.conversations
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|c| c.brand_id == *brand_id)
            .ok_or(InboxError::NotFound)
    }

    pub async fn get_thread(&self, brand_id: &BrandId, id: &ConversationId) -> Result<Thread, InboxError> {
        let conversation = self.get(brand_id, id).await?;
        let messages = self
            .conversations
            .list_messages(id)
            .await
            .map_err(storage)?;
        Ok(Thread {
            conversation,
            messages,
        })
    }

    pub async fn mark_read(&self, brand_id: &BrandId, id: &ConversationId) -> Result<Conversation, InboxError> {
        let mut conversation = self.get(brand_id, id).await?;
        if conversation.unread_count == 0 {
            return Ok(conversation);
        }
        conversation.unread_count = 0;
        self.conversations
            .update(&conversation)
            .await
            .map_err(storage)
    }

    pub async fn set_status(
        &self,
        brand_id: &BrandId,
        id: &ConversationId,
        actor: Actor,
        status: ConversationStatus,
    ) -> Result<Conversation, InboxError> {
        if !actor.role.can_edit() {
            return Err(InboxError::Forbidden("viewers cannot triage conversations".to_string()));
        }
        let mut conversation = self.get(brand_id, id).await?;
        conversation.status = status;
        if matches!(status, ConversationStatus::Resolved | ConversationStatus::Archived) {
            conversation.unread_count = 0;
        }
        self.conversations
            .update(&conversation)
            .await
            .map_err(storage)
    }

    /// Where a reply to this conversation goes on the platform.
    fn reply_target(conversation: &Conversation, last_inbound: Option<&Message>) -> ReplyTarget {
        match conversation.kind {
            ConversationKind::Comment => ReplyTarget::Comment {
                comment_id: conversation.external_thread_id.clone(),
            },
            ConversationKind::DirectMessage => ReplyTarget::DirectMessage {
                recipient_id: conversation.external_thread_id.clone(),
            },
            ConversationKind::Mention => ReplyTarget::Mention {
                media_id: conversation
                    .media_external_id
                    .clone()
                    .unwrap_or_else(|| conversation.external_thread_id.clone()),
                comment_id: last_inbound.and_then(|m| m.external_id.clone()),
            },
        }
    }

    /// Send a reply through the platform and record it.
    pub async fn reply(
        &self,
        brand_id: &BrandId,
        id: &ConversationId,
        actor: Actor,
        text: &str,
    ) -> Result<Message, InboxError> {
        if !actor.role.can_edit() {
            return Err(InboxError::Forbidden("viewers cannot reply".to_string()));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(InboxError::EmptyReply);
        }

        let mut conversation = self.get(brand_id, id).await?;
        let account = self
            .accounts
            .get_by_id(&conversation.social_account_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| InboxError::UnknownAccount(conversation.social_account_id.to_string()))?;

        let messages = self
            .conversations
            .list_messages(id)
            .await
            .map_err(storage)?;
        let last_inbound = messages
            .iter()
            .rev()
            .find(|m| m.direction == MessageDirection::Inbound);
        let target = Self::reply_target(&conversation, last_inbound);

        let external_id = self.publisher.reply(&account, &target, text).await?;
        let now = Utc::now();
        let message = Message {
            id: MessageId::new(),
            conversation_id: conversation.id,
            direction: MessageDirection::Outbound,
            body: text.to_string(),
            external_id: Some(external_id),
            sender_handle: Some(account.handle.clone()),
            sent_at: now,
        };
        let message = self
            .conversations
            .add_message(&message)
            .await
            .map_err(storage)?;

        conversation.unread_count = 0;
        conversation.last_message_at = now;
        conversation.last_message_preview = Some(preview(text));
        if conversation.status == ConversationStatus::Open {
            conversation.status = ConversationStatus::Pending;
        }
        self.conversations
            .update(&conversation)
            .await
            .map_err(storage)?;

        tracing::info!(conversation_id = %id, kind = %conversation.kind, "sent reply");
        Ok(message)
    }

    /// Pull the comments of a published media item and ingest them.
    pub async fn sync_comments(
        &self,
        brand_id: &BrandId,
        account_id: &AccountId,
        media_id: &str,
    ) -> Result<SyncReport, InboxError> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await
            .map_err(storage)?
            .filter(|a| a.brand_id == *brand_id)
            .ok_or_else(|| InboxError::UnknownAccount(account_id.to_string()))?;

        let events = self.publisher.fetch_comments(&account, media_id).await?;
        let mut report = SyncReport {
            fetched: events.len(),
            stored: 0,
        };
        for event in events {
            if let IngestOutcome::Stored(_) = self.ingest(event).await? {
                report.stored += 1;
            }
        }
        tracing::info!(account_id = %account_id, media_id, fetched = report.fetched, stored = report.stored, "synced comments");
        Ok(report)
    }

    /// Draft a reply for a conversation with the AI generator.
    pub async fn suggest_reply<G: ContentGenerator, R: SlideRenderer + 'static>(
        &self,
        brand_id: &BrandId,
        id: &ConversationId,
        content: &ContentService<G, R>,
    ) -> Result<String, InboxError> {
        let thread = self.get_thread(brand_id, id).await?;
        let platform = self
            .accounts
            .get_by_id(&thread.conversation.social_account_id)
            .await
            .map_err(storage)?
            .map(|a| a.platform);
        Ok(content
            .suggest_reply(&thread.conversation, &thread.messages, platform)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use socialdesk_types::account::Platform;
    use socialdesk_types::brand::UserRole;
    use socialdesk_types::id::UserId;

    use crate::testing::{FakePublisher, MemAccounts, MemConversations, account};

    const IG: &str = "17841400000000001";

    struct Fixture {
        service: InboxService<MemConversations, MemAccounts, FakePublisher>,
        conversations: MemConversations,
        publisher: FakePublisher,
        brand_id: BrandId,
        account_id: AccountId,
    }

    fn fixture() -> Fixture {
        let brand_id = BrandId::new();
        let ig = account(brand_id, Platform::Instagram, IG);
        let conversations = MemConversations::default();
        let publisher = FakePublisher::default();
        Fixture {
            service: InboxService::new(conversations.clone(), MemAccounts::with(&[&ig]), publisher.clone()),
            conversations,
            publisher,
            brand_id,
            account_id: ig.id,
        }
    }

    fn event(kind: ConversationKind, thread: &str, msg: &str, at: DateTime<Utc>) -> InboundEvent {
        InboundEvent {
            platform: Platform::Instagram,
            account_external_id: IG.to_string(),
            kind,
            thread_id: thread.to_string(),
            sender_id: Some("user-42".to_string()),
            sender_handle: Some("coffee_fan".to_string()),
            text: format!("message {msg}"),
            external_message_id: Some(msg.to_string()),
            media_external_id: Some("media-1".to_string()),
            timestamp: at,
        }
    }

    fn stored(outcome: IngestOutcome) -> Conversation {
        match outcome {
            IngestOutcome::Stored(c) => c,
            other => panic!("expected stored, got {other:?}"),
        }
    }

    fn editor() -> Actor {
        Actor::user(UserId::new(), UserRole::Editor)
    }

    #[tokio::test]
    async fn test_ingest_threads_and_dedupes() {
        let f = fixture();
        let t0 = Utc::now();
        let first = stored(f.service.ingest(event(ConversationKind::DirectMessage, "user-42", "m1", t0)).await.unwrap());
        let second = stored(
            f.service
                .ingest(event(ConversationKind::DirectMessage, "user-42", "m2", t0 + Duration::seconds(5)))
                .await
                .unwrap(),
        );
        assert_eq!(first.id, second.id);
        assert_eq!(second.unread_count, 2);
        assert_eq!(second.last_message_preview.as_deref(), Some("message m2"));

        let dup = f
            .service
            .ingest(event(ConversationKind::DirectMessage, "user-42", "m2", t0))
            .await
            .unwrap();
        assert!(matches!(dup, IngestOutcome::Duplicate));
        assert_eq!(f.conversations.message_count(), 2);
    }

    #[tokio::test]
    async fn test_ingest_unknown_account() {
        let f = fixture();
        let mut ev = event(ConversationKind::Comment, "c1", "c1", Utc::now());
        ev.account_external_id = "nope".to_string();
        assert!(matches!(
            f.service.ingest(ev).await.unwrap_err(),
            InboxError::UnknownAccount(_)
        ));
    }

    #[tokio::test]
    async fn test_ingest_ignores_own_echo() {
        let f = fixture();
        let mut ev = event(ConversationKind::DirectMessage, "user-42", "m1", Utc::now());
        ev.sender_id = Some(IG.to_string());
        assert!(matches!(f.service.ingest(ev).await.unwrap(), IngestOutcome::Ignored));
        assert_eq!(f.conversations.message_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_to_comment_moves_to_pending() {
        let f = fixture();
        let conv = stored(f.service.ingest(event(ConversationKind::Comment, "c-root", "c-root", Utc::now())).await.unwrap());

        let err = f.service.reply(&f.brand_id, &conv.id, editor(), "   ").await.unwrap_err();
        assert!(matches!(err, InboxError::EmptyReply));

        let msg = f.service.reply(&f.brand_id, &conv.id, editor(), "Thanks!").await.unwrap();
        assert_eq!(msg.direction, MessageDirection::Outbound);

        let replies = f.publisher.replies.lock().unwrap().clone();
        assert_eq!(
            replies[0].0,
            ReplyTarget::Comment {
                comment_id: "c-root".to_string()
            }
        );

        let after = f.conversations.get(&conv.id).unwrap();
        assert_eq!(after.status, ConversationStatus::Pending);
        assert_eq!(after.unread_count, 0);

        // the customer answers: back to open
        let reopened = stored(
            f.service
                .ingest(event(ConversationKind::Comment, "c-root", "c-2", Utc::now()))
                .await
                .unwrap(),
        );
        assert_eq!(reopened.status, ConversationStatus::Open);
    }

    #[tokio::test]
    async fn test_reply_targets_by_kind() {
        let f = fixture();
        let dm = stored(f.service.ingest(event(ConversationKind::DirectMessage, "user-42", "m1", Utc::now())).await.unwrap());
        let mention = stored(f.service.ingest(event(ConversationKind::Mention, "media-9", "cm-5", Utc::now())).await.unwrap());

        f.service.reply(&f.brand_id, &dm.id, editor(), "hi").await.unwrap();
        f.service.reply(&f.brand_id, &mention.id, editor(), "thanks for the tag").await.unwrap();

        let replies = f.publisher.replies.lock().unwrap().clone();
        assert_eq!(
            replies[0].0,
            ReplyTarget::DirectMessage {
                recipient_id: "user-42".to_string()
            }
        );
        assert_eq!(
            replies[1].0,
            ReplyTarget::Mention {
                media_id: "media-1".to_string(),
                comment_id: Some("cm-5".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_resolved_reopens_and_mark_read() {
        let f = fixture();
        let conv = stored(f.service.ingest(event(ConversationKind::DirectMessage, "u", "m1", Utc::now())).await.unwrap());
        let resolved = f
            .service
            .set_status(&f.brand_id, &conv.id, editor(), ConversationStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(resolved.unread_count, 0);

        let reopened = stored(f.service.ingest(event(ConversationKind::DirectMessage, "u", "m2", Utc::now())).await.unwrap());
        assert_eq!(reopened.status, ConversationStatus::Open);
        assert_eq!(reopened.unread_count, 1);

        let read = f.service.mark_read(&f.brand_id, &conv.id).await.unwrap();
        assert_eq!(read.unread_count, 0);
    }

    #[tokio::test]
    async fn test_thread_scoped_to_brand() {
        let f = fixture();
        let conv = stored(f.service.ingest(event(ConversationKind::DirectMessage, "u", "m1", Utc::now())).await.unwrap());
        assert!(matches!(
            f.service.get_thread(&BrandId::new(), &conv.id).await.unwrap_err(),
            InboxError::NotFound
        ));
        let thread = f.service.get_thread(&f.brand_id, &conv.id).await.unwrap();
        assert_eq!(thread.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_viewer_cannot_reply() {
        let f = fixture();
        let conv = stored(f.service.ingest(event(ConversationKind::DirectMessage, "u", "m1", Utc::now())).await.unwrap());
        let viewer = Actor::user(UserId::new(), UserRole::Viewer);
        assert!(matches!(
            f.service.reply(&f.brand_id, &conv.id, viewer, "hi").await.unwrap_err(),
            InboxError::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn test_sync_comments_counts_new_only() {
        let f = fixture();
        let now = Utc::now();
        *f.publisher.comments.lock().unwrap() = vec![
            event(ConversationKind::Comment, "c1", "c1", now),
            event(ConversationKind::Comment, "c2", "c2", now),
        ];
        let report = f.service.sync_comments(&f.brand_id, &f.account_id, "media-1").await.unwrap();
        assert_eq!((report.fetched, report.stored), (2, 2));

        let again = f.service.sync_comments(&f.brand_id, &f.account_id, "media-1").await.unwrap();
        assert_eq!((again.fetched, again.stored), (2, 0));
    }
}
