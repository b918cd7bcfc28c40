use axum::{
    extract::State,
    routing::get,
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    response::{ApiJson, ApiPath, WebResponse},
    state::AppState,
    users::dto::{PublicUser, UserUpdateRequest},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<WebResponse<Vec<PublicUser>>> {
    Ok(WebResponse::ok(state.users.find_all().await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<PublicUser>> {
    Ok(WebResponse::ok(state.users.find_by_id(user_id).await?))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UserUpdateRequest>,
) -> AppResult<WebResponse<PublicUser>> {
    let user = state.users.update(user_id, payload).await?;
    info!(caller = %caller.sub, user_id = %user.id, "update user");
    Ok(WebResponse::ok(user))
}

#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<&'static str>> {
    state.users.delete(user_id).await?;
    info!(caller = %caller.sub, %user_id, "delete user");
    Ok(WebResponse::ok("user deleted"))
}
