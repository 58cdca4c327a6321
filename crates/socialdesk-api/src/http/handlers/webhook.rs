//! Meta webhook receiver.
//!
//! `GET` answers the subscription handshake with `META_VERIFY_TOKEN`.
//! `POST` checks `X-Hub-Signature-256` against `META_APP_SECRET`, then
//! feeds every normalized event into the inbox. Per-event failures are
//! logged and counted; the delivery itself is still acknowledged so Meta
//! does not redeliver it.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use socialdesk_core::service::inbox::IngestOutcome;
use socialdesk_infra::meta::webhook::{SIGNATURE_HEADER, parse_webhook, verify_signature, verify_subscription};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DeliveryReport {
    pub received: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// GET /webhooks/meta - echo `hub.challenge` when the verify token matches.
pub async fn verify(State(state): State<AppState>, Query(query): Query<HandshakeQuery>) -> Result<String, AppError> {
    let expected = state
        .webhook
        .verify_token
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("webhook verify token is not configured".to_string()))?;

    let challenge = verify_subscription(
        expected.expose_secret(),
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
    )
    .map_err(|e| AppError::Forbidden(e.to_string()))?;

    tracing::info!("meta webhook subscription verified");
    Ok(challenge.to_string())
}

/// POST /webhooks/meta
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<DeliveryReport>>, AppError> {
    let timer = Timer::start();
    let secret = state
        .webhook
        .app_secret
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("webhook app secret is not configured".to_string()))?;

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    verify_signature(secret.expose_secret().as_bytes(), &body, signature).map_err(|e| {
        tracing::warn!(error = %e, "rejected webhook delivery");
        AppError::Unauthorized(e.to_string())
    })?;

    let events = parse_webhook(&body).map_err(|e| AppError::Validation(e.to_string()))?;
    let mut report = DeliveryReport {
        received: events.len(),
        ..Default::default()
    };

    for event in events {
        let thread = event.thread_id.clone();
        match state.inbox_service.ingest(event).await {
            Ok(IngestOutcome::Stored(_)) => report.stored += 1,
            Ok(IngestOutcome::Duplicate) => report.duplicates += 1,
            Ok(IngestOutcome::Ignored) => report.ignored += 1,
            Err(e) => {
                tracing::warn!(thread = %thread, error = %e, "failed to ingest webhook event");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        received = report.received,
        stored = report.stored,
        duplicates = report.duplicates,
        failed = report.failed,
        "processed meta webhook"
    );
    Ok(Json(timer.finish(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    use socialdesk_core::repository::conversation::ConversationFilter;
    use socialdesk_infra::meta::webhook::sign_payload;
    use socialdesk_types::account::{ConnectAccountRequest, Platform};
    use socialdesk_types::brand::CreateBrandRequest;

    use crate::state::{WebhookSecrets, test_state};

    async fn state_with_secrets() -> (AppState, tempfile::TempDir) {
        let (mut state, dir) = test_state().await;
        state.webhook = std::sync::Arc::new(WebhookSecrets {
            app_secret: Some(SecretString::from("app-secret")),
            verify_token: Some(SecretString::from("vt-123")),
        });
        (state, dir)
    }

    fn comment_payload() -> Vec<u8> {
        json!({
            "object": "instagram",
            "entry": [{
                "id": "17841400000001",
                "time": 1_772_359_200,
                "changes": [{
                    "field": "comments",
                    "value": {
                        "id": "c1", "text": "love this!",
                        "from": {"id": "u9", "username": "kai"},
                        "media": {"id": "m1"}
                    }
                }]
            }]
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_handshake() {
        let (state, _dir) = state_with_secrets().await;
        let ok = verify(
            State(state.clone()),
            Query(HandshakeQuery {
                mode: Some("subscribe".to_string()),
                verify_token: Some("vt-123".to_string()),
                challenge: Some("4242".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok, "4242");

        let err = verify(
            State(state),
            Query(HandshakeQuery {
                mode: Some("subscribe".to_string()),
                verify_token: Some("wrong".to_string()),
                challenge: Some("4242".to_string()),
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unsigned_delivery_rejected() {
        let (state, _dir) = state_with_secrets().await;
        let err = receive(State(state), HeaderMap::new(), Bytes::from(comment_payload())).await;
        assert!(matches!(err, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_signed_delivery_lands_in_inbox() {
        let (state, _dir) = state_with_secrets().await;
        let brand = state
            .brand_service
            .create_brand(CreateBrandRequest {
                name: "Acme".to_string(),
                industry: None,
                website: None,
                requires_approval: false,
            })
            .await
            .unwrap();
        state
            .account_service
            .connect(
                &brand.id,
                ConnectAccountRequest {
                    platform: Platform::Instagram,
                    handle: "acme".to_string(),
                    external_id: "17841400000001".to_string(),
                    display_name: None,
                    access_token: "EAAB-token".to_string(),
                    token_expires_at: None,
                },
            )
            .await
            .unwrap();

        let body = comment_payload();
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            sign_payload(b"app-secret", &body).unwrap().parse().unwrap(),
        );

        let Json(resp) = receive(State(state.clone()), headers.clone(), Bytes::from(body.clone()))
            .await
            .unwrap();
        let report = resp.data.unwrap();
        assert_eq!((report.received, report.stored), (1, 1));

        // Redelivery of the same comment is recognized.
        let Json(resp) = receive(State(state.clone()), headers, Bytes::from(body)).await.unwrap();
        assert_eq!(resp.data.unwrap().duplicates, 1);

        let inbox = state
            .inbox_service
            .list(&brand.id, ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].external_thread_id, "c1");
    }
}
