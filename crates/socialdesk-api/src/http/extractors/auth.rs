//! API key authentication extractor.
//!
//! Keys are read from `Authorization: Bearer <key>` or `X-API-Key: <key>`
//! and resolved to the user that owns them. Every handler taking an
//! [`Authenticated`] is scoped to that user's brand.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use socialdesk_core::service::Actor;
use socialdesk_types::brand::AuthContext;
use socialdesk_types::id::BrandId;

use crate::http::error::AppError;
use crate::state::AppState;

/// The caller behind a valid API key.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub AuthContext);

impl Authenticated {
    pub fn brand_id(&self) -> BrandId {
        self.0.brand_id
    }

    pub fn actor(&self) -> Actor {
        Actor::user(self.0.user_id, self.0.role)
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let context = state
            .api_keys
            .authenticate(&api_key)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header."
                        .to_string(),
                )
            })?;
        Ok(Authenticated(context))
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-API-Key header encoding".to_string()))?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use socialdesk_types::brand::{CreateBrandRequest, CreateUserRequest, UserRole};

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/posts");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer_and_header() {
        assert_eq!(
            extract_api_key(&parts(&[("authorization", "Bearer sdk_abc ")])).unwrap(),
            "sdk_abc"
        );
        assert_eq!(extract_api_key(&parts(&[("x-api-key", "sdk_xyz")])).unwrap(), "sdk_xyz");
        assert!(matches!(
            extract_api_key(&parts(&[("authorization", "Basic Zm9v")])),
            Err(AppError::Unauthorized(_))
        ));
        assert!(extract_api_key(&parts(&[])).is_err());
    }

    #[tokio::test]
    async fn test_authenticate_resolves_user() {
        let (state, _dir) = crate::state::test_state().await;
        let brand = state
            .brand_service
            .create_brand(CreateBrandRequest {
                name: "Acme Coffee".to_string(),
                industry: None,
                website: None,
                requires_approval: true,
            })
            .await
            .unwrap();
        let user = state
            .brand_service
            .add_user(
                &brand.id,
                CreateUserRequest {
                    email: "ed@acme.test".to_string(),
                    name: "Ed".to_string(),
                    role: Some(UserRole::Editor),
                },
            )
            .await
            .unwrap();
        let (key, _) = state.api_keys.issue(&user, Some("ci")).await.unwrap();

        let mut p = parts(&[("x-api-key", key.as_str())]);
        let auth = Authenticated::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(auth.brand_id(), brand.id);
        assert_eq!(auth.actor().user_id, Some(user.id));

        let mut bad = parts(&[("authorization", "Bearer sdk_nope")]);
        assert!(matches!(
            Authenticated::from_request_parts(&mut bad, &state).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
