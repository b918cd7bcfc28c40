use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_foreign_key_violation;
use crate::error::{AppError, AppResult};
use crate::projects::repo_types::{Project, ProjectFields, ProjectRow};

const COLUMNS: &str =
    "id, name, description, progress, confidence, trend, user_id, created_at, updated_at";

pub async fn insert(db: &PgPool, user_id: Uuid, f: &ProjectFields) -> AppResult<Project> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        INSERT INTO projects (id, name, description, progress, confidence, trend, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&f.name)
    .bind(&f.description)
    .bind(f.progress)
    .bind(f.confidence)
    .bind(f.trend.as_str())
    .bind(user_id)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        e if is_foreign_key_violation(&e) => AppError::not_found("user not found"),
        e => e.into(),
    })?;
    Ok(Project::try_from(row)?)
}

pub async fn update(db: &PgPool, id: Uuid, f: &ProjectFields) -> anyhow::Result<Option<Project>> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        UPDATE projects
           SET name = $1, description = $2, progress = $3, confidence = $4, trend = $5,
               updated_at = now()
         WHERE id = $6
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&f.name)
    .bind(&f.description)
    .bind(f.progress)
    .bind(f.confidence)
    .bind(f.trend.as_str())
    .bind(id)
    .fetch_optional(db)
    .await
    .context("update project")?
    .map(Project::try_from)
    .transpose()
}

/// Tasks of the project go with it (`ON DELETE CASCADE`).
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete project")?;
    Ok(res.rows_affected() > 0)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Project>> {
    sqlx::query_as::<_, ProjectRow>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find project by id")?
        .map(Project::try_from)
        .transpose()
}

pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list projects by user")?;
    rows.into_iter().map(Project::try_from).collect()
}

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await
    .context("list projects")?;
    rows.into_iter().map(Project::try_from).collect()
}
