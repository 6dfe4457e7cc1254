use axum::{extract::State, routing::post, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        services,
    },
    error::{ApiJson, ApiResult},
    response::Envelope,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin", post(admin_login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<Envelope<TokenResponse>> {
    let token = services::register(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Envelope::created(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Envelope<TokenResponse>> {
    let token = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Envelope::ok(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Envelope<TokenResponse>> {
    let token = services::admin_login(&state.config.admin, &state.jwt, payload)?;
    Ok(Envelope::ok(TokenResponse { token }))
}
