use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::auth::sessions::{RefreshSession, SessionError, SessionRegistry};

/// `SessionRegistry` backed by the `refresh_sessions` table.
#[derive(Clone)]
pub struct PgSessionRegistry {
    db: PgPool,
}

impl PgSessionRegistry {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRegistry for PgSessionRegistry {
    async fn save(&self, s: RefreshSession) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (id, user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (token) DO UPDATE
               SET id = EXCLUDED.id,
                   user_id = EXCLUDED.user_id,
                   expires_at = EXCLUDED.expires_at,
                   created_at = EXCLUDED.created_at
            "#,
        )
        .bind(s.id)
        .bind(s.user_id)
        .bind(&s.token)
        .bind(s.expires_at)
        .bind(s.created_at)
        .execute(&self.db)
        .await
        .context("save refresh session")?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<RefreshSession, SessionError> {
        let session = sqlx::query_as::<_, RefreshSession>(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM refresh_sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find refresh session")?
        .ok_or(SessionError::NotFound)?;

        if session.is_expired_at(OffsetDateTime::now_utc()) {
            self.delete(token).await?;
            debug!(session_id = %session.id, "expired refresh session evicted");
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM refresh_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await
            .context("delete refresh session")?;
        Ok(())
    }

    async fn rotate(&self, old_token: &str, next: RefreshSession) -> Result<(), SessionError> {
        let mut tx = self.db.begin().await?;

        // The row lock taken by DELETE serializes concurrent rotations of one token.
        let expires_at: Option<OffsetDateTime> = sqlx::query_scalar(
            "DELETE FROM refresh_sessions WHERE token = $1 RETURNING expires_at",
        )
        .bind(old_token)
        .fetch_optional(&mut *tx)
        .await?;

        match expires_at {
            None => return Err(SessionError::NotFound),
            Some(at) if at <= OffsetDateTime::now_utc() => {
                tx.commit().await?;
                return Err(SessionError::Expired);
            }
            Some(_) => {}
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (id, user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(next.id)
        .bind(next.user_id)
        .bind(&next.token)
        .bind(next.expires_at)
        .bind(next.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn revoke_user(&self, user_id: Uuid) -> Result<u64, SessionError> {
        let res = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("revoke user sessions")?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{
        repo::PgAccountStore,
        repo_types::{NewUser, Role},
        store::AccountStore,
    };
    use std::time::Duration;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 3600);

    async fn owner(pool: &PgPool) -> Uuid {
        let (user, _) = PgAccountStore::new(pool.clone())
            .create_with_profile(NewUser {
                full_name: "Ann".into(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: "$argon2id$stub".into(),
                role: Role::Se,
            })
            .await
            .unwrap();
        user.id
    }

    async fn rows(pool: &PgPool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM refresh_sessions")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn lapsed(user_id: Uuid, token: &str) -> RefreshSession {
        let mut s = RefreshSession::new(user_id, token.into(), WEEK);
        s.expires_at = OffsetDateTime::now_utc() - time::Duration::minutes(1);
        s
    }

    #[sqlx::test]
    async fn save_find_delete(pool: PgPool) {
        let reg = PgSessionRegistry::new(pool.clone());
        let user_id = owner(&pool).await;
        let session = RefreshSession::new(user_id, "t1".into(), WEEK);
        reg.save(session.clone()).await.unwrap();

        let found = reg.find_by_token("t1").await.unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, user_id);

        reg.delete("t1").await.unwrap();
        reg.delete("t1").await.unwrap();
        assert!(matches!(reg.find_by_token("t1").await, Err(SessionError::NotFound)));
    }

    #[sqlx::test]
    async fn expired_row_is_deleted_on_lookup(pool: PgPool) {
        let reg = PgSessionRegistry::new(pool.clone());
        let user_id = owner(&pool).await;
        reg.save(lapsed(user_id, "old")).await.unwrap();

        assert!(matches!(reg.find_by_token("old").await, Err(SessionError::Expired)));
        assert_eq!(rows(&pool).await, 0);
        assert!(matches!(reg.find_by_token("old").await, Err(SessionError::NotFound)));
    }

    #[sqlx::test]
    async fn rotate_replaces_and_refuses_lapsed(pool: PgPool) {
        let reg = PgSessionRegistry::new(pool.clone());
        let user_id = owner(&pool).await;
        reg.save(RefreshSession::new(user_id, "a".into(), WEEK)).await.unwrap();

        reg.rotate("a", RefreshSession::new(user_id, "b".into(), WEEK)).await.unwrap();
        assert!(matches!(reg.find_by_token("a").await, Err(SessionError::NotFound)));
        reg.find_by_token("b").await.unwrap();

        reg.save(lapsed(user_id, "stale")).await.unwrap();
        let err = reg
            .rotate("stale", RefreshSession::new(user_id, "c".into(), WEEK))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Expired));
        assert!(matches!(reg.find_by_token("c").await, Err(SessionError::NotFound)));
        assert_eq!(rows(&pool).await, 1);
    }

    #[sqlx::test]
    async fn concurrent_rotations_of_one_token_have_one_winner(pool: PgPool) {
        let reg = PgSessionRegistry::new(pool.clone());
        let user_id = owner(&pool).await;
        reg.save(RefreshSession::new(user_id, "shared".into(), WEEK)).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = reg.clone();
                tokio::spawn(async move {
                    reg.rotate("shared", RefreshSession::new(user_id, format!("next-{i}"), WEEK))
                        .await
                })
            })
            .collect();

        let mut won = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => won += 1,
                Err(SessionError::NotFound) => {}
                Err(e) => panic!("unexpected rotate error: {e}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(rows(&pool).await, 1);
    }

    #[sqlx::test]
    async fn revoke_user_drops_only_that_users_sessions(pool: PgPool) {
        let reg = PgSessionRegistry::new(pool.clone());
        let ann = owner(&pool).await;
        let bob = owner(&pool).await;
        reg.save(RefreshSession::new(ann, "a1".into(), WEEK)).await.unwrap();
        reg.save(RefreshSession::new(ann, "a2".into(), WEEK)).await.unwrap();
        reg.save(RefreshSession::new(bob, "b1".into(), WEEK)).await.unwrap();

        assert_eq!(reg.revoke_user(ann).await.unwrap(), 2);
        assert_eq!(rows(&pool).await, 1);
        reg.find_by_token("b1").await.unwrap();
    }
}
