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
    projects::{
        dto::{ProjectCreateRequest, ProjectUpdateRequest},
        repo,
        repo_types::Project,
    },
    response::{ApiJson, ApiPath, WebResponse},
    state::AppState,
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/by-user/:user_id", get(list_projects_by_user))
        .route(
            "/projects/by-id/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

fn missing() -> AppError {
    AppError::not_found("project not found")
}

#[instrument(skip(state, _caller, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(payload): ApiJson<ProjectCreateRequest>,
) -> AppResult<WebResponse<Project>> {
    let fields = payload.validate()?;
    let project = repo::insert(&state.db, payload.user_id, &fields).await?;
    info!(project_id = %project.id, user_id = %project.user_id, trend = %project.trend, "project created");
    Ok(WebResponse::created(project))
}

#[instrument(skip(state, _caller))]
pub async fn list_projects(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<WebResponse<Vec<Project>>> {
    Ok(WebResponse::ok(repo::find_all(&state.db).await?))
}

#[instrument(skip(state, _caller))]
pub async fn list_projects_by_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Vec<Project>>> {
    Ok(WebResponse::ok(repo::find_by_user_id(&state.db, user_id).await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_project(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Project>> {
    let project = repo::find_by_id(&state.db, id).await?.ok_or_else(missing)?;
    Ok(WebResponse::ok(project))
}

#[instrument(skip(state, _caller, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProjectUpdateRequest>,
) -> AppResult<WebResponse<Project>> {
    let fields = payload.validate()?;
    let project = repo::update(&state.db, id, &fields).await?.ok_or_else(missing)?;
    info!(project_id = %id, "project updated");
    Ok(WebResponse::ok(project))
}

#[instrument(skip(state, _caller))]
pub async fn delete_project(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<WebResponse<&'static str>> {
    if !repo::delete(&state.db, id).await? {
        return Err(missing());
    }
    info!(project_id = %id, "project deleted");
    Ok(WebResponse::ok("project deleted"))
}
