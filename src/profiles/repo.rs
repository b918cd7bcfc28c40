use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::{is_foreign_key_violation, is_unique_violation};
use crate::error::{AppError, AppResult};
use crate::profiles::repo_types::{Profile, ProfileRow};
use crate::users::repo_types::User;

/// Write the profile mirror of a freshly inserted user on the same transaction.
pub async fn insert_mirror_tx(
    tx: &mut Transaction<'_, Postgres>,
    user: &User,
) -> sqlx::Result<Profile> {
    let profile = Profile::mirror_of(user);
    insert_tx(tx, &profile).await?;
    Ok(profile)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    profile: &Profile,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, user_id, full_name, email, role)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(profile.id)
    .bind(profile.user_id)
    .bind(profile.full_name.trim())
    .bind(crate::validation::normalize_email(&profile.email))
    .bind(profile.role.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert(db: &PgPool, profile: &Profile) -> AppResult<()> {
    let mut tx = db.begin().await?;
    match insert_tx(&mut tx, profile).await {
        Ok(()) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::conflict("profile already exists for this user"))
        }
        Err(e) if is_foreign_key_violation(&e) => {
            return Err(AppError::not_found("user not found"))
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit().await?;
    Ok(())
}

/// Overwrite every column of the row with `profile.id`. Returns false if no such row.
pub async fn update(db: &PgPool, profile: &Profile) -> AppResult<bool> {
    let res = sqlx::query(
        r#"
        UPDATE profiles
           SET user_id = $1, full_name = $2, email = $3, role = $4
         WHERE id = $5
        "#,
    )
    .bind(profile.user_id)
    .bind(profile.full_name.trim())
    .bind(crate::validation::normalize_email(&profile.email))
    .bind(profile.role.as_str())
    .bind(profile.id)
    .execute(db)
    .await
    .map_err(|e| match e {
        e if is_unique_violation(&e) => AppError::conflict("profile already exists for this user"),
        e if is_foreign_key_violation(&e) => AppError::not_found("user not found"),
        e => e.into(),
    })?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, profile_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(profile_id)
        .execute(db)
        .await
        .context("delete profile")?;
    Ok(res.rows_affected() > 0)
}

pub async fn find_by_id(db: &PgPool, profile_id: Uuid) -> anyhow::Result<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, user_id, full_name, email, role
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(profile_id)
    .fetch_optional(db)
    .await
    .context("find profile by id")?
    .map(Profile::try_from)
    .transpose()
}

pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, user_id, full_name, email, role
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find profile by user")?
    .map(Profile::try_from)
    .transpose()
}

pub async fn find_all(db: &PgPool) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, user_id, full_name, email, role
        FROM profiles
        ORDER BY full_name
        "#,
    )
    .fetch_all(db)
    .await
    .context("list profiles")?;
    rows.into_iter().map(Profile::try_from).collect()
}
