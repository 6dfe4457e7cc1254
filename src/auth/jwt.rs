use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{AdminClaims, TokenKind, UserClaims};
use crate::config::{AdminConfig, JwtConfig};
use crate::state::AppState;

/// Signing material plus the two verification policies.
///
/// User and admin tokens share the secret but not the audience, and each
/// verifier checks its own `kind`, so neither token opens the other's routes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    user_audience: String,
    admin_audience: String,
    user_ttl: Duration,
    admin_ttl: Duration,
    admin_email: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

fn ttl(minutes: i64) -> Duration {
    Duration::from_secs(minutes.max(1) as u64 * 60)
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig, admin: &AdminConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            user_audience: cfg.audience.clone(),
            admin_audience: cfg.admin_audience.clone(),
            user_ttl: ttl(cfg.ttl_minutes),
            admin_ttl: ttl(cfg.admin_ttl_minutes),
            admin_email: admin.email.clone(),
        }
    }

    fn window(ttl: Duration) -> (usize, usize) {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        (now.unix_timestamp() as usize, exp.unix_timestamp() as usize)
    }

    fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(&[audience]);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    pub fn sign_user(&self, user_id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = Self::window(self.user_ttl);
        let claims = UserClaims {
            sub: user_id,
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.user_audience.clone(),
            kind: TokenKind::User,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "user jwt signed");
        Ok(token)
    }

    pub fn sign_admin(&self) -> anyhow::Result<String> {
        let (iat, exp) = Self::window(self.admin_ttl);
        let claims = AdminClaims {
            sub: self.admin_email.clone(),
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.admin_audience.clone(),
            kind: TokenKind::Admin,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!("admin jwt signed");
        Ok(token)
    }

    pub fn verify_user(&self, token: &str) -> anyhow::Result<UserClaims> {
        let data = decode::<UserClaims>(token, &self.decoding, &self.validation(&self.user_audience))?;
        if data.claims.kind != TokenKind::User {
            anyhow::bail!("not a user token");
        }
        debug!(user_id = %data.claims.sub, "user jwt verified");
        Ok(data.claims)
    }

    pub fn verify_admin(&self, token: &str) -> anyhow::Result<AdminClaims> {
        let data =
            decode::<AdminClaims>(token, &self.decoding, &self.validation(&self.admin_audience))?;
        if data.claims.kind != TokenKind::Admin {
            anyhow::bail!("not an admin token");
        }
        // tokens minted for a previous admin account stop working on rotation
        if data.claims.sub != self.admin_email {
            anyhow::bail!("admin token subject mismatch");
        }
        debug!("admin jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-users".into(),
            admin_audience: "test-admin".into(),
            ttl_minutes: 5,
            admin_ttl_minutes: 5,
        }
    }

    fn admin(email: &str) -> AdminConfig {
        AdminConfig {
            email: email.into(),
            password: "admin-pass".into(),
        }
    }

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&jwt_config("dev-secret"), &admin("admin@shop.com"))
    }

    #[test]
    fn sign_and_verify_user_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_user(user_id).expect("sign user");
        let claims = keys.verify_user(&token).expect("verify user");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-users");
        assert_eq!(claims.kind, TokenKind::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn sign_and_verify_admin_token() {
        let keys = make_keys();
        let token = keys.sign_admin().expect("sign admin");
        let claims = keys.verify_admin(&token).expect("verify admin");
        assert_eq!(claims.sub, "admin@shop.com");
        assert_eq!(claims.kind, TokenKind::Admin);
        assert!(!token.contains("admin-pass"));
    }

    #[test]
    fn user_token_is_not_an_admin_token() {
        let keys = make_keys();
        let token = keys.sign_user(Uuid::new_v4()).unwrap();
        assert!(keys.verify_admin(&token).is_err());
    }

    #[test]
    fn admin_token_is_not_a_user_token() {
        let keys = make_keys();
        let token = keys.sign_admin().unwrap();
        assert!(keys.verify_user(&token).is_err());
    }

    #[test]
    fn admin_token_dies_with_admin_rotation() {
        let old = make_keys();
        let rotated = JwtKeys::new(&jwt_config("dev-secret"), &admin("new-admin@shop.com"));
        let token = old.sign_admin().unwrap();
        let err = rotated.verify_admin(&token).unwrap_err();
        assert!(err.to_string().contains("subject mismatch"));
    }

    #[test]
    fn rejects_foreign_secret() {
        let ours = make_keys();
        let theirs = JwtKeys::new(&jwt_config("other-secret"), &admin("admin@shop.com"));
        let token = theirs.sign_user(Uuid::new_v4()).unwrap();
        assert!(ours.verify_user(&token).is_err());
    }

    #[test]
    fn rejects_tampered_token() {
        let keys = make_keys();
        let token = keys.sign_user(Uuid::new_v4()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = keys.sign_user(Uuid::new_v4()).unwrap();
        // splice another token's payload under the original signature
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        assert!(keys.verify_user(&parts.join(".")).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = UserClaims {
            sub: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "test-issuer".into(),
            aud: "test-users".into(),
            kind: TokenKind::User,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify_user(&token).is_err());
    }
}
