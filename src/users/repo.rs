use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::profiles::{self, repo_types::Profile};
use crate::users::repo_types::{NewUser, User, UserPatch, UserRow};
use crate::users::store::AccountStore;
use crate::validation::normalize_email;

const EMAIL_TAKEN: &str = "email already registered";

/// `AccountStore` over the `users` and `profiles` tables.
#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::conflict(EMAIL_TAKEN)
    } else {
        AppError::Internal(e.into())
    }
}

async fn insert_tx(tx: &mut Transaction<'_, Postgres>, user: &NewUser) -> sqlx::Result<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, full_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.full_name.trim())
    .bind(normalize_email(&user.email))
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .fetch_one(&mut **tx)
    .await
}

async fn lock_live_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
        FROM users
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_with_profile(&self, user: NewUser) -> AppResult<(User, Profile)> {
        let mut tx = self.db.begin().await?;

        let row = insert_tx(&mut tx, &user).await.map_err(map_write_err)?;
        let created = User::try_from(row)?;
        let profile = profiles::repo::insert_mirror_tx(&mut tx, &created)
            .await
            .context("insert profile mirror")?;

        tx.commit().await?;
        debug!(user_id = %created.id, profile_id = %profile.id, "user and profile committed");
        Ok((created, profile))
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let mut tx = self.db.begin().await?;

        let mut user = match lock_live_tx(&mut tx, id).await? {
            Some(row) => User::try_from(row)?,
            None => return Err(AppError::not_found("user not found")),
        };
        patch.apply(&mut user);

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET full_name = $1, email = $2, password_hash = $3, role = $4, updated_at = now()
             WHERE id = $5 AND deleted_at IS NULL
            RETURNING id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_err)?;

        tx.commit().await?;
        Ok(User::try_from(row)?)
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET deleted_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("soft delete user")?;
        debug!(user_id = %id, affected = res.rows_affected(), "user soft delete");
        Ok(res.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        rows.into_iter()
            .map(|r| User::try_from(r).map_err(AppError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            full_name: " Ann Lee ".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            role: Role::Se,
        }
    }

    async fn count(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn create_writes_user_and_mirrored_profile(pool: PgPool) {
        let store = PgAccountStore::new(pool.clone());
        let (user, profile) = store.create_with_profile(new_user(" Ann@Example.COM")).await.unwrap();

        assert_eq!(user.full_name, "Ann Lee");
        assert_eq!(user.email, "ann@example.com");
        let stored = profiles::repo::find_by_user_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored, profile);
        assert_eq!(stored.email, "ann@example.com");
        assert_eq!(stored.role, Role::Se);
    }

    #[sqlx::test]
    async fn duplicate_email_is_conflict_and_writes_nothing(pool: PgPool) {
        let store = PgAccountStore::new(pool.clone());
        store.create_with_profile(new_user("a@b.com")).await.unwrap();

        let err = store.create_with_profile(new_user("A@B.com ")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(count(&pool, "users").await, 1);
        assert_eq!(count(&pool, "profiles").await, 1);
    }

    #[sqlx::test]
    async fn uncommitted_registration_leaves_no_rows(pool: PgPool) {
        {
            let mut tx = pool.begin().await.unwrap();
            let row = insert_tx(&mut tx, &new_user("a@b.com")).await.unwrap();
            let user = User::try_from(row).unwrap();
            profiles::repo::insert_mirror_tx(&mut tx, &user).await.unwrap();
            // dropped without commit
        }
        assert_eq!(count(&pool, "users").await, 0);
        assert_eq!(count(&pool, "profiles").await, 0);
    }

    #[sqlx::test]
    async fn soft_deleted_user_is_invisible_and_email_reusable(pool: PgPool) {
        let store = PgAccountStore::new(pool.clone());
        let (first, _) = store.create_with_profile(new_user("a@b.com")).await.unwrap();

        assert!(store.soft_delete(first.id).await.unwrap());
        assert!(!store.soft_delete(first.id).await.unwrap());
        assert!(store.find_by_id(first.id).await.unwrap().is_none());
        assert!(store.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(store.find_all().await.unwrap().is_empty());

        let (second, _) = store.create_with_profile(new_user("a@b.com")).await.unwrap();
        assert_ne!(second.id, first.id);
        let found = store.find_by_email("A@B.COM").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert_eq!(count(&pool, "users").await, 2);
    }

    #[sqlx::test]
    async fn update_merges_patch_and_bumps_updated_at(pool: PgPool) {
        let store = PgAccountStore::new(pool);
        let (user, _) = store.create_with_profile(new_user("a@b.com")).await.unwrap();

        let updated = store
            .update(
                user.id,
                UserPatch {
                    full_name: Some("  ".into()),
                    email: Some(" New@B.com".into()),
                    role: Some(Role::Sce),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Ann Lee");
        assert_eq!(updated.email, "new@b.com");
        assert_eq!(updated.role, Role::Sce);
        assert_eq!(updated.password_hash, user.password_hash);
        assert!(updated.updated_at >= user.updated_at);
    }

    #[sqlx::test]
    async fn update_reports_collision_and_missing_rows(pool: PgPool) {
        let store = PgAccountStore::new(pool);
        store.create_with_profile(new_user("taken@b.com")).await.unwrap();
        let (user, _) = store.create_with_profile(new_user("a@b.com")).await.unwrap();

        let clash = UserPatch {
            email: Some("taken@b.com".into()),
            ..Default::default()
        };
        assert!(matches!(store.update(user.id, clash).await, Err(AppError::Conflict(_))));

        store.soft_delete(user.id).await.unwrap();
        let err = store.update(user.id, UserPatch::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test]
    async fn concurrent_partial_updates_both_land(pool: PgPool) {
        let store = PgAccountStore::new(pool);
        let (user, _) = store.create_with_profile(new_user("a@b.com")).await.unwrap();

        let rename = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update(
                        user.id,
                        UserPatch {
                            full_name: Some("Renamed".into()),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        let promote = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update(
                        user.id,
                        UserPatch {
                            role: Some(Role::Sce),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        rename.await.unwrap().unwrap();
        promote.await.unwrap().unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.full_name, "Renamed");
        assert_eq!(stored.role, Role::Sce);
    }
}
