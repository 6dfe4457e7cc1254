use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::ApiError;

/// Header the storefront and admin console send their token in.
pub const TOKEN_HEADER: &str = "token";

/// Verified shopper identity.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

/// Verified admin console session.
#[derive(Debug)]
pub struct AuthAdmin;

fn missing() -> ApiError {
    ApiError::Unauthorized("Not Authorized Login Again".into())
}

fn invalid() -> ApiError {
    ApiError::Unauthorized("Invalid or expired token".into())
}

/// `token: <jwt>`, or `Authorization: Bearer <jwt>` as a fallback.
fn read_token(parts: &Parts) -> Option<&str> {
    if let Some(v) = parts.headers.get(TOKEN_HEADER) {
        return v.to_str().ok().map(str::trim).filter(|t| !t.is_empty());
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = read_token(parts).ok_or_else(missing)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_user(token).map_err(|e| {
            warn!(error = %e, "user token rejected");
            invalid()
        })?;
        Ok(AuthUser(claims.sub))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = read_token(parts).ok_or_else(missing)?;
        let keys = JwtKeys::from_ref(state);
        keys.verify_admin(token).map_err(|e| {
            warn!(error = %e, "admin token rejected");
            invalid()
        })?;
        Ok(AuthAdmin)
    }
}
