use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
    },
    config::AdminConfig,
    error::{ApiError, ApiResult},
    users::{repo::UserStore, repo_types::NewUser},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the account and returns a user token for it.
pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    payload: RegisterRequest,
) -> ApiResult<String> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);

    if name.is_empty() {
        return Err(ApiError::Validation("Please enter your name".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Please enter a valid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("Please enter a strong password".into()));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password_blocking(payload.password)
        .await
        .map_err(ApiError::internal("Server error"))?;

    // a concurrent registration can still win the race; the unique index
    // turns that into StoreError::DuplicateEmail -> Conflict
    let user = users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    let token = keys
        .sign_user(user.id)
        .map_err(ApiError::internal("Server error"))?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(token)
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> ApiResult<String> {
    let email = normalize_email(&payload.email);

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::NotFound("User doesn't exist".into()));
    };

    if !user.status {
        warn!(user_id = %user.id, "login on disabled account");
        return Err(ApiError::AccountDisabled);
    }

    let ok = verify_password_blocking(payload.password, user.password_hash.clone())
        .await
        .map_err(ApiError::internal("Server error"))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys
        .sign_user(user.id)
        .map_err(ApiError::internal("Server error"))?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub fn admin_login(
    admin: &AdminConfig,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> ApiResult<String> {
    let email = payload.email.trim();
    if email != admin.email || payload.password != admin.password {
        warn!(email = %email, "admin login rejected");
        return Err(ApiError::InvalidCredentials);
    }
    let token = keys
        .sign_admin()
        .map_err(ApiError::internal("Server error"))?;
    info!("admin logged in");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@shop.co.uk"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at.com"));
        assert!(!is_valid_email("sp ace@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}
