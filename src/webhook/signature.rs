use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::AppState;

/// Middleware for Voice API webhooks.
///
/// With `webhook.signature_secret` unset every request passes, matching the
/// platform's unsigned delivery. With it set, the `Authorization: Bearer`
/// JWT must verify as HS256 under the secret.
pub async fn verify_signature(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(secret) = state.config.webhook.signature_secret.as_deref() else {
        return next.run(req).await;
    };

    match check_signature(req.headers(), secret) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), "Rejected webhook: {e}");
            (StatusCode::UNAUTHORIZED, "Invalid webhook signature").into_response()
        }
    }
}

pub fn check_signature(headers: &HeaderMap, secret: &str) -> Result<(), SignatureError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(SignatureError::Missing)?;

    let mut validation = Validation::new(Algorithm::HS256);
    // Signed webhooks carry iat/jti but not necessarily exp
    validation.required_spec_claims.clear();

    decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}
