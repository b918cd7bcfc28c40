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
    response::{ApiJson, ApiPath, WebResponse},
    state::AppState,
    tasks::{
        dto::{TaskCreateRequest, TaskUpdateRequest},
        repo,
        repo_types::Task,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/project/:project_id", get(list_tasks_by_project))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
}

fn missing() -> AppError {
    AppError::not_found("task not found")
}

#[instrument(skip(state, _caller, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiJson(payload): ApiJson<TaskCreateRequest>,
) -> AppResult<WebResponse<Task>> {
    let project_id = payload.project_id;
    let fields = payload.validate()?;
    let task = repo::insert(&state.db, project_id, &fields).await?;
    info!(task_id = %task.id, %project_id, "task created");
    Ok(WebResponse::created(task))
}

#[instrument(skip(state, _caller))]
pub async fn list_tasks(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<WebResponse<Vec<Task>>> {
    Ok(WebResponse::ok(repo::find_all(&state.db).await?))
}

#[instrument(skip(state, _caller))]
pub async fn list_tasks_by_project(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(project_id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Vec<Task>>> {
    Ok(WebResponse::ok(repo::find_by_project_id(&state.db, project_id).await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_task(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<WebResponse<Task>> {
    let task = repo::find_by_id(&state.db, id).await?.ok_or_else(missing)?;
    Ok(WebResponse::ok(task))
}

#[instrument(skip(state, _caller, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TaskUpdateRequest>,
) -> AppResult<WebResponse<Task>> {
    let fields = payload.validate()?;
    let task = repo::update(&state.db, id, &fields).await?.ok_or_else(missing)?;
    info!(task_id = %id, status = task.status.as_str(), "task updated");
    Ok(WebResponse::ok(task))
}

#[instrument(skip(state, _caller))]
pub async fn delete_task(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<WebResponse<&'static str>> {
    if !repo::delete(&state.db, id).await? {
        return Err(missing());
    }
    info!(task_id = %id, "task deleted");
    Ok(WebResponse::ok("task deleted"))
}
