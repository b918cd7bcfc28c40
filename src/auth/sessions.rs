//! Refresh session registry.
//!
//! A refresh session binds one refresh token string to its owner and an
//! absolute expiry. Lookups of a lapsed session delete it and report
//! `SessionError::Expired`; there is no background sweep.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl RefreshSession {
    pub fn new(user_id: Uuid, token: String, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("refresh session not found")]
    NotFound,
    #[error("refresh session expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        SessionError::Store(e.into())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => AppError::Auth(AuthError::SessionNotFound),
            SessionError::Expired => AppError::Auth(AuthError::SessionExpired),
            SessionError::Store(e) => AppError::Internal(e),
        }
    }
}

/// Keyed store of live refresh sessions. Implementations must be safe to
/// share across request tasks.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Insert or replace the entry for `session.token`.
    async fn save(&self, session: RefreshSession) -> Result<(), SessionError>;

    /// Live entry for `token`. A lapsed entry is removed before `Expired` is returned.
    async fn find_by_token(&self, token: &str) -> Result<RefreshSession, SessionError>;

    /// Remove the entry for `token`, if any.
    async fn delete(&self, token: &str) -> Result<(), SessionError>;

    /// Atomically remove `old_token` and insert `next`.
    ///
    /// Exactly one of several concurrent rotations of the same token wins; the
    /// rest see `NotFound`. If the removed entry had lapsed, `next` is not
    /// inserted and `Expired` is returned.
    async fn rotate(&self, old_token: &str, next: RefreshSession) -> Result<(), SessionError>;

    /// Drop every session owned by `user_id`; returns how many were dropped.
    async fn revoke_user(&self, user_id: Uuid) -> Result<u64, SessionError>;
}

/// Process-local registry guarded by a mutex.
#[derive(Default)]
pub struct MemorySessionRegistry {
    sessions: Mutex<HashMap<String, RefreshSession>>,
}

impl MemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn save(&self, session: RefreshSession) -> Result<(), SessionError> {
        let mut map = self.sessions.lock().await;
        map.insert(session.token.clone(), session);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<RefreshSession, SessionError> {
        let mut map = self.sessions.lock().await;
        let session = map.get(token).cloned().ok_or(SessionError::NotFound)?;
        if session.is_expired_at(OffsetDateTime::now_utc()) {
            map.remove(token);
            debug!(session_id = %session.id, "expired refresh session evicted");
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.lock().await.remove(token);
        Ok(())
    }

    async fn rotate(&self, old_token: &str, next: RefreshSession) -> Result<(), SessionError> {
        let mut map = self.sessions.lock().await;
        let old = map.remove(old_token).ok_or(SessionError::NotFound)?;
        if old.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(SessionError::Expired);
        }
        map.insert(next.token.clone(), next);
        Ok(())
    }

    async fn revoke_user(&self, user_id: Uuid) -> Result<u64, SessionError> {
        let mut map = self.sessions.lock().await;
        let before = map.len();
        map.retain(|_, s| s.user_id != user_id);
        Ok((before - map.len()) as u64)
    }
}
