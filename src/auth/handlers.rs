use axum::{extract::State, routing::post, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenPair},
        extractors::RefreshToken,
    },
    error::AppResult,
    response::{ApiJson, WebResponse},
    state::AppState,
    users::dto::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<WebResponse<PublicUser>> {
    let user = state.auth.register(payload).await?;
    Ok(WebResponse::created(user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<WebResponse<TokenPair>> {
    let pair = state.auth.login(payload).await?;
    Ok(WebResponse::ok(pair))
}

#[instrument(skip(state, token))]
pub async fn refresh(
    State(state): State<AppState>,
    RefreshToken(token): RefreshToken,
) -> AppResult<WebResponse<TokenPair>> {
    let pair = state.auth.refresh(&token).await?;
    Ok(WebResponse::ok(pair))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    RefreshToken(token): RefreshToken,
) -> AppResult<WebResponse<&'static str>> {
    state.auth.logout(&token).await?;
    Ok(WebResponse::ok("logged out"))
}
