use axum::{
    extract::State,
    routing::get,
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    profiles::{dto::ProfileRequest, repo, repo_types::Profile},
    response::{ApiJson, ApiPath, WebResponse},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(list_profiles).post(create_profile))
        .route("/profiles/by-user/:user_id", get(get_profile_by_user))
        .route(
            "/profiles/by-id/:profile_id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

fn missing() -> AppError {
    AppError::not_found("profile not found")
}

#[instrument(skip(state, _caller, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(payload): ApiJson<ProfileRequest>,
) -> AppResult<WebResponse<Profile>> {
    let profile = payload.into_profile(Uuid::new_v4())?;
    repo::insert(&state.db, &profile).await?;
    info!(profile_id = %profile.id, user_id = %profile.user_id, "profile created");
    Ok(WebResponse::created(profile))
}

#[instrument(skip(state, _caller))]
pub async fn list_profiles(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<WebResponse<Vec<Profile>>> {
    Ok(WebResponse::ok(repo::find_all(&state.db).await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_profile(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(profile_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Profile>> {
    let profile = repo::find_by_id(&state.db, profile_id).await?.ok_or_else(missing)?;
    Ok(WebResponse::ok(profile))
}

#[instrument(skip(state, _caller))]
pub async fn get_profile_by_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Profile>> {
    let profile = repo::find_by_user_id(&state.db, user_id).await?.ok_or_else(missing)?;
    Ok(WebResponse::ok(profile))
}

#[instrument(skip(state, _caller, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(profile_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProfileRequest>,
) -> AppResult<WebResponse<Profile>> {
    let profile = payload.into_profile(profile_id)?;
    if !repo::update(&state.db, &profile).await? {
        return Err(missing());
    }
    info!(%profile_id, "profile updated");
    Ok(WebResponse::ok(profile))
}

#[instrument(skip(state, _caller))]
pub async fn delete_profile(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(profile_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<&'static str>> {
    if !repo::delete(&state.db, profile_id).await? {
        return Err(missing());
    }
    info!(%profile_id, "profile deleted");
    Ok(WebResponse::ok("profile deleted"))
}
