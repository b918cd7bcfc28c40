use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_foreign_key_violation;
use crate::error::{AppError, AppResult};
use crate::tasks::repo_types::{Task, TaskFields, TaskRow};

const COLUMNS: &str = "id, project_id, title, status, priority, effort, difficulty_level, \
    deliverable, bottleneck, progress, continue_tomorrow, created_at, updated_at";

pub async fn insert(db: &PgPool, project_id: Uuid, f: &TaskFields) -> AppResult<Task> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        r#"
        INSERT INTO tasks (id, project_id, title, status, priority, effort, difficulty_level,
                           deliverable, bottleneck, progress, continue_tomorrow)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(project_id)
    .bind(&f.title)
    .bind(f.status.as_str())
    .bind(f.priority.as_str())
    .bind(f.effort)
    .bind(&f.difficulty_level)
    .bind(&f.deliverable)
    .bind(&f.bottleneck)
    .bind(&f.progress)
    .bind(f.continue_tomorrow)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        e if is_foreign_key_violation(&e) => AppError::not_found("project not found"),
        e => e.into(),
    })?;
    Ok(Task::try_from(row)?)
}

pub async fn update(db: &PgPool, id: Uuid, f: &TaskFields) -> anyhow::Result<Option<Task>> {
    sqlx::query_as::<_, TaskRow>(&format!(
        r#"
        UPDATE tasks
           SET title = $1, status = $2, priority = $3, effort = $4, difficulty_level = $5,
               deliverable = $6, bottleneck = $7, progress = $8, continue_tomorrow = $9,
               updated_at = now()
         WHERE id = $10
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&f.title)
    .bind(f.status.as_str())
    .bind(f.priority.as_str())
    .bind(f.effort)
    .bind(&f.difficulty_level)
    .bind(&f.deliverable)
    .bind(&f.bottleneck)
    .bind(&f.progress)
    .bind(f.continue_tomorrow)
    .bind(id)
    .fetch_optional(db)
    .await
    .context("update task")?
    .map(Task::try_from)
    .transpose()
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete task")?;
    Ok(res.rows_affected() > 0)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Task>> {
    sqlx::query_as::<_, TaskRow>(&format!("SELECT {COLUMNS} FROM tasks WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find task by id")?
        .map(Task::try_from)
        .transpose()
}

pub async fn find_by_project_id(db: &PgPool, project_id: Uuid) -> anyhow::Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at"
    ))
    .bind(project_id)
    .fetch_all(db)
    .await
    .context("list tasks by project")?;
    rows.into_iter().map(Task::try_from).collect()
}

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {COLUMNS} FROM tasks ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await
    .context("list tasks")?;
    rows.into_iter().map(Task::try_from).collect()
}
