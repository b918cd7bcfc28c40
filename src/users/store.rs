use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::profiles::repo_types::Profile;
use crate::users::repo_types::{NewUser, User, UserPatch};

/// Persistence for user identities. Every read is scoped to rows that have
/// not been soft-deleted.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert the user and its mirrored profile atomically.
    ///
    /// Fails with `AppError::Conflict` when a live user already owns the email;
    /// nothing is written in that case.
    async fn create_with_profile(&self, user: NewUser) -> AppResult<(User, Profile)>;

    /// Merge `patch` onto the live row and bump `updated_at`.
    ///
    /// `AppError::NotFound` if no live row has `id`, `AppError::Conflict` if the
    /// new email collides.
    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<User>;

    /// Stamp `deleted_at` in one statement. Returns false when no live row had
    /// `id`; a repeated call is harmless and reports false.
    async fn soft_delete(&self, id: Uuid) -> AppResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// `email` is normalized before lookup.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_all(&self) -> AppResult<Vec<User>>;
}
