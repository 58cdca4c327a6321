//! Meta webhook handling: subscription handshake, payload signature
//! verification, and normalization of deliveries into [`InboundEvent`]s.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use socialdesk_types::account::Platform;
use socialdesk_types::inbox::{ConversationKind, InboundEvent};

use super::types::GraphUser;
use crate::crypto::vault::{hex_decode, hex_encode};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook signature verification failed")]
    SignatureMismatch,

    #[error("missing webhook signature header")]
    MissingSignature,

    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("verify token mismatch")]
    VerifyTokenMismatch,

    #[error("malformed webhook payload: {0}")]
    Malformed(String),
}

/// Verify an `X-Hub-Signature-256` value (`sha256=<hex>`) against the raw body.
///
/// Comparison is constant-time via `Mac::verify_slice`.
pub fn verify_signature(app_secret: &[u8], body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
    let signature = signature.ok_or(WebhookError::MissingSignature)?;
    let hex_sig = signature.strip_prefix("sha256=").unwrap_or(signature);
    let expected = hex_decode(hex_sig).map_err(|_| WebhookError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(app_secret).map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}

/// `sha256=<hex>` header value for `body`, as Meta computes it.
pub fn sign_payload(app_secret: &[u8], body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(app_secret).map_err(|e| WebhookError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(format!("sha256={}", hex_encode(&mac.finalize().into_bytes())))
}

/// Answer the subscription handshake (`hub.mode=subscribe`). Returns the
/// challenge to echo back when the verify token matches.
pub fn verify_subscription<'a>(
    expected_token: &str,
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
) -> Result<&'a str, WebhookError> {
    let token = token.unwrap_or_default();
    if mode != Some("subscribe") || !constant_time_eq(expected_token.as_bytes(), token.as_bytes()) {
        return Err(WebhookError::VerifyTokenMismatch);
    }
    challenge.ok_or_else(|| WebhookError::Malformed("missing hub.challenge".to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    object: String,
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntry {
    id: String,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    changes: Vec<Change>,
    #[serde(default)]
    messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
struct Change {
    field: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: IdRef,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    mid: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    is_echo: bool,
    #[serde(default)]
    attachments: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct InstagramComment {
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    from: Option<GraphUser>,
    #[serde(default)]
    media: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
struct InstagramMention {
    media_id: String,
    #[serde(default)]
    comment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageFeedChange {
    item: String,
    verb: String,
    #[serde(default)]
    comment_id: Option<String>,
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    from: Option<GraphUser>,
    #[serde(default)]
    created_time: Option<i64>,
}

/// Parse a webhook body into inbound events.
///
/// Instagram (`object: "instagram"`) and page (`object: "page"`) deliveries
/// are understood; other objects yield no events. Individual changes that
/// do not match the expected shape are skipped with a warning.
pub fn parse_webhook(body: &[u8]) -> Result<Vec<InboundEvent>, WebhookError> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

    let platform = match payload.object.as_str() {
        "instagram" => Platform::Instagram,
        "page" => Platform::Facebook,
        other => {
            tracing::debug!(object = other, "ignoring webhook for unhandled object");
            return Ok(Vec::new());
        }
    };

    let mut events = Vec::new();
    for entry in payload.entry {
        let entry_time = entry.time.and_then(from_epoch).unwrap_or_else(Utc::now);

        for change in entry.changes {
            let parsed = match (platform, change.field.as_str()) {
                (Platform::Instagram, "comments") => instagram_comment(&entry.id, entry_time, change.value),
                (Platform::Instagram, "mentions") => instagram_mention(&entry.id, entry_time, change.value),
                (Platform::Facebook, "feed") => page_comment(&entry.id, entry_time, change.value),
                (_, field) => {
                    tracing::debug!(field, "ignoring webhook change");
                    Ok(None)
                }
            };
            match parsed {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => tracing::warn!(field = %change.field, error = %e, "skipping malformed webhook change"),
            }
        }

        for messaging in entry.messaging {
            if let Some(event) = direct_message(platform, &entry.id, entry_time, messaging) {
                events.push(event);
            }
        }
    }
    Ok(events)
}

fn instagram_comment(
    account: &str,
    time: DateTime<Utc>,
    value: serde_json::Value,
) -> Result<Option<InboundEvent>, serde_json::Error> {
    let comment: InstagramComment = serde_json::from_value(value)?;
    Ok(Some(InboundEvent {
        platform: Platform::Instagram,
        account_external_id: account.to_string(),
        kind: ConversationKind::Comment,
        thread_id: comment.parent_id.unwrap_or_else(|| comment.id.clone()),
        sender_id: comment.from.as_ref().map(|f| f.id.clone()),
        sender_handle: comment.from.and_then(|f| f.username),
        text: comment.text.unwrap_or_default(),
        external_message_id: Some(comment.id),
        media_external_id: comment.media.map(|m| m.id),
        timestamp: time,
    }))
}

fn instagram_mention(
    account: &str,
    time: DateTime<Utc>,
    value: serde_json::Value,
) -> Result<Option<InboundEvent>, serde_json::Error> {
    let mention: InstagramMention = serde_json::from_value(value)?;
    let text = if mention.comment_id.is_some() {
        "Mentioned you in a comment"
    } else {
        "Mentioned you in a post"
    };
    Ok(Some(InboundEvent {
        platform: Platform::Instagram,
        account_external_id: account.to_string(),
        kind: ConversationKind::Mention,
        thread_id: mention.comment_id.clone().unwrap_or_else(|| mention.media_id.clone()),
        sender_id: None,
        sender_handle: None,
        text: text.to_string(),
        // post mentions carry no message id of their own
        external_message_id: Some(
            mention
                .comment_id
                .unwrap_or_else(|| format!("mention:{}", mention.media_id)),
        ),
        media_external_id: Some(mention.media_id),
        timestamp: time,
    }))
}

fn page_comment(
    page: &str,
    time: DateTime<Utc>,
    value: serde_json::Value,
) -> Result<Option<InboundEvent>, serde_json::Error> {
    let change: PageFeedChange = serde_json::from_value(value)?;
    if change.item != "comment" || change.verb != "add" {
        return Ok(None);
    }
    let Some(comment_id) = change.comment_id else {
        return Ok(None);
    };
    // a reply under another comment continues that comment's thread
    let thread_id = match (&change.parent_id, &change.post_id) {
        (Some(parent), Some(post)) if parent != post => parent.clone(),
        _ => comment_id.clone(),
    };
    Ok(Some(InboundEvent {
        platform: Platform::Facebook,
        account_external_id: page.to_string(),
        kind: ConversationKind::Comment,
        thread_id,
        sender_id: change.from.as_ref().map(|f| f.id.clone()),
        sender_handle: change.from.and_then(|f| f.name.or(f.username)),
        text: change.message.unwrap_or_default(),
        external_message_id: Some(comment_id),
        media_external_id: change.post_id,
        timestamp: change.created_time.and_then(from_epoch).unwrap_or(time),
    }))
}

fn direct_message(
    platform: Platform,
    account: &str,
    time: DateTime<Utc>,
    event: MessagingEvent,
) -> Option<InboundEvent> {
    let message = event.message?;
    if message.is_echo {
        return None;
    }
    let text = match message.text {
        Some(text) => text,
        None if !message.attachments.is_empty() => "[attachment]".to_string(),
        None => return None,
    };
    Some(InboundEvent {
        platform,
        account_external_id: account.to_string(),
        kind: ConversationKind::DirectMessage,
        thread_id: event.sender.id.clone(),
        sender_id: Some(event.sender.id),
        sender_handle: None,
        text,
        external_message_id: Some(message.mid),
        media_external_id: None,
        timestamp: event.timestamp.and_then(from_epoch).unwrap_or(time),
    })
}

/// Epoch seconds or milliseconds (Messenger timestamps are in ms).
fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value > 100_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Graph API timestamps look like `2026-03-01T10:00:00+0000`.
pub(crate) fn parse_graph_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        sign_payload(secret, body).unwrap()
    }

    #[test]
    fn test_signature_valid_and_tampered() {
        let body = br#"{"object":"instagram","entry":[]}"#;
        let sig = sign(b"app-secret", body);
        assert!(verify_signature(b"app-secret", body, Some(&sig)).is_ok());
        assert!(matches!(
            verify_signature(b"app-secret", b"{}", Some(&sig)),
            Err(WebhookError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(b"other", body, Some(&sig)),
            Err(WebhookError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(b"app-secret", body, Some("sha256=zz")),
            Err(WebhookError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(b"app-secret", body, None),
            Err(WebhookError::MissingSignature)
        ));
    }

    #[test]
    fn test_subscription_handshake() {
        assert_eq!(
            verify_subscription("vt", Some("subscribe"), Some("vt"), Some("12345")).unwrap(),
            "12345"
        );
        assert!(verify_subscription("vt", Some("subscribe"), Some("nope"), Some("1")).is_err());
        assert!(verify_subscription("vt", Some("unsubscribe"), Some("vt"), Some("1")).is_err());
        assert!(verify_subscription("vt", Some("subscribe"), None, Some("1")).is_err());
    }

    #[test]
    fn test_parse_instagram_comment_reply_joins_parent_thread() {
        let body = json!({
            "object": "instagram",
            "entry": [{
                "id": "1784",
                "time": 1_772_359_200,
                "changes": [{
                    "field": "comments",
                    "value": {
                        "id": "c2", "parent_id": "c1", "text": "same question",
                        "from": {"id": "u9", "username": "kai"},
                        "media": {"id": "m1", "media_product_type": "FEED"}
                    }
                }]
            }]
        });
        let events = parse_webhook(body.to_string().as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.platform, Platform::Instagram);
        assert_eq!(e.account_external_id, "1784");
        assert_eq!(e.kind, ConversationKind::Comment);
        assert_eq!(e.thread_id, "c1");
        assert_eq!(e.external_message_id.as_deref(), Some("c2"));
        assert_eq!(e.sender_handle.as_deref(), Some("kai"));
        assert_eq!(e.media_external_id.as_deref(), Some("m1"));
        assert_eq!(e.timestamp.timestamp(), 1_772_359_200);
    }

    #[test]
    fn test_parse_mentions_and_messages() {
        let body = json!({
            "object": "instagram",
            "entry": [{
                "id": "1784",
                "time": 1_772_359_200,
                "changes": [{"field": "mentions", "value": {"media_id": "m7", "comment_id": "c7"}}],
                "messaging": [
                    {"sender": {"id": "u1"}, "recipient": {"id": "1784"}, "timestamp": 1_772_359_260_000i64,
                     "message": {"mid": "mid.1", "text": "is this in stock?"}},
                    {"sender": {"id": "1784"}, "recipient": {"id": "u1"}, "timestamp": 1_772_359_270_000i64,
                     "message": {"mid": "mid.2", "text": "yes!", "is_echo": true}},
                    {"sender": {"id": "u1"}, "recipient": {"id": "1784"}, "timestamp": 1_772_359_280_000i64,
                     "message": {"mid": "mid.3", "attachments": [{"type": "image"}]}},
                    {"sender": {"id": "u1"}, "recipient": {"id": "1784"}, "read": {"mid": "mid.2"}}
                ]
            }]
        });
        let events = parse_webhook(body.to_string().as_bytes()).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].kind, ConversationKind::Mention);
        assert_eq!(events[0].thread_id, "c7");
        assert_eq!(events[0].external_message_id.as_deref(), Some("c7"));
        assert_eq!(events[0].media_external_id.as_deref(), Some("m7"));

        assert_eq!(events[1].kind, ConversationKind::DirectMessage);
        assert_eq!(events[1].thread_id, "u1");
        assert_eq!(events[1].text, "is this in stock?");
        assert_eq!(events[1].timestamp.timestamp(), 1_772_359_260);

        assert_eq!(events[2].text, "[attachment]");
    }

    #[test]
    fn test_post_mention_has_stable_message_id() {
        let body = json!({
            "object": "instagram",
            "entry": [{
                "id": "1784",
                "time": 1_772_359_200,
                "changes": [{"field": "mentions", "value": {"media_id": "m8"}}]
            }]
        })
        .to_string();
        let first = parse_webhook(body.as_bytes()).unwrap();
        let again = parse_webhook(body.as_bytes()).unwrap();

        assert_eq!(first[0].text, "Mentioned you in a post");
        assert_eq!(first[0].thread_id, "m8");
        assert_eq!(first[0].external_message_id.as_deref(), Some("mention:m8"));
        assert_eq!(first[0].external_message_id, again[0].external_message_id);
    }

    #[test]
    fn test_parse_page_feed() {
        let body = json!({
            "object": "page",
            "entry": [{
                "id": "555",
                "time": 1_772_359_200,
                "changes": [
                    {"field": "feed", "value": {
                        "item": "comment", "verb": "add", "comment_id": "555_1_c1",
                        "post_id": "555_1", "parent_id": "555_1", "message": "nice",
                        "from": {"id": "u3", "name": "Jo Doe"}, "created_time": 1_772_359_100
                    }},
                    {"field": "feed", "value": {
                        "item": "comment", "verb": "add", "comment_id": "555_1_c2",
                        "post_id": "555_1", "parent_id": "555_1_c1", "message": "agreed"
                    }},
                    {"field": "feed", "value": {"item": "reaction", "verb": "add", "post_id": "555_1"}},
                    {"field": "feed", "value": {"unexpected": true}}
                ]
            }]
        });
        let events = parse_webhook(body.to_string().as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].platform, Platform::Facebook);
        assert_eq!(events[0].thread_id, "555_1_c1");
        assert_eq!(events[0].sender_handle.as_deref(), Some("Jo Doe"));
        assert_eq!(events[0].timestamp.timestamp(), 1_772_359_100);
        assert_eq!(events[1].thread_id, "555_1_c1");
        assert_eq!(events[1].external_message_id.as_deref(), Some("555_1_c2"));
    }

    #[test]
    fn test_unknown_object_and_malformed_body() {
        let events = parse_webhook(br#"{"object":"whatsapp_business_account","entry":[]}"#).unwrap();
        assert!(events.is_empty());
        assert!(matches!(parse_webhook(b"not json"), Err(WebhookError::Malformed(_))));
    }

    #[test]
    fn test_parse_graph_time() {
        let t = parse_graph_time("2026-03-01T10:00:00+0000").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-03-01T10:00:00+00:00");
        assert!(parse_graph_time("2026-03-01T10:00:00Z").is_some());
        assert!(parse_graph_time("yesterday").is_none());
    }
}
