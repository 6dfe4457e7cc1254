use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub admin_audience: String,
    pub ttl_minutes: i64,
    pub admin_ttl_minutes: i64,
}

/// The single admin account. Not stored in the database.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Host prefix used to build absolute image URLs, without trailing slash.
    pub public_base_url: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "globalmart".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "globalmart-users".into()),
            admin_audience: std::env::var("JWT_ADMIN_AUDIENCE")
                .unwrap_or_else(|_| "globalmart-admin".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 7),
            admin_ttl_minutes: env_parse("JWT_ADMIN_TTL_MINUTES").unwrap_or(60 * 12),
        };
        let admin = AdminConfig {
            email: std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?,
            password: std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?,
        };

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let public_base_url = if production {
            std::env::var("LIVE_URL").context("LIVE_URL is required when APP_ENV=production")?
        } else {
            std::env::var("LOCAL_URL").unwrap_or_else(|_| "http://localhost:4000".into())
        };
        let uploads = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes: env_parse("UPLOAD_MAX_BYTES").unwrap_or(5 * 1024 * 1024),
        };

        Ok(Self {
            database_url,
            jwt,
            admin,
            uploads,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
