use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
};

// Token payload written under auth:{token} by the external auth service.
// This service only validates; issuance and revocation live elsewhere.
#[derive(Debug, Deserialize)]
struct TokenData {
    user_id: Uuid,
    username: String,
    expires_at: i64, // epoch milliseconds
}

#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = bearer.token();

        let Some(payload) = state.redis.get_auth_token(token).await? else {
            return Err(AppError::Authentication(
                "Invalid or expired token".to_string(),
            ));
        };

        let data: TokenData = serde_json::from_str(&payload)
            .map_err(|_| AppError::Authentication("Malformed token payload".to_string()))?;

        if data.expires_at < Utc::now().timestamp_millis() {
            // The KV TTL normally handles this; the stamp is a fallback
            let _ = state.redis.delete_auth_token(token).await;
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        Ok(AuthUser {
            user_id: data.user_id,
            username: data.username,
        })
    }
}

// Optional auth user (for endpoints that work with or without auth)
#[derive(Debug)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(_) => Ok(OptionalAuthUser(None)),
        }
    }
}
