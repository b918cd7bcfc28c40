use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{password::hash_password_blocking, sessions::SessionRegistry},
    error::{AppError, AppResult},
    users::{
        dto::{PublicUser, UserUpdateRequest},
        repo_types::{Role, UserPatch},
        store::AccountStore,
    },
    validation::{is_valid_email, non_blank, normalize_email},
};

#[derive(Clone)]
pub struct UserService {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionRegistry>,
}

impl UserService {
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<dyn SessionRegistry>) -> Self {
        Self { accounts, sessions }
    }

    pub async fn find_all(&self) -> AppResult<Vec<PublicUser>> {
        let users = self.accounts.find_all().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<PublicUser> {
        self.accounts
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Partial update; blank fields keep the stored value.
    #[instrument(skip(self, req))]
    pub async fn update(&self, id: Uuid, req: UserUpdateRequest) -> AppResult<PublicUser> {
        let role = non_blank(req.role)
            .map(|r| r.parse::<Role>())
            .transpose()?;

        let email = non_blank(req.email).map(|e| normalize_email(&e));
        if let Some(email) = &email {
            if !is_valid_email(email) {
                warn!(user_id = %id, "update with invalid email");
                return Err(AppError::validation("invalid email"));
            }
        }

        let password_hash = match non_blank(req.password) {
            Some(plain) => Some(hash_password_blocking(plain).await?),
            None => None,
        };

        let patch = UserPatch {
            full_name: non_blank(req.full_name),
            email,
            password_hash,
            role,
        };
        let user = self.accounts.update(id, patch).await?;
        info!(user_id = %user.id, "user updated");
        Ok(PublicUser::from(user))
    }

    /// Soft delete and drop every refresh session the user still holds.
    /// Deleting an already deleted or unknown user is `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.accounts.soft_delete(id).await? {
            return Err(AppError::not_found("user not found"));
        }
        let revoked = self.sessions.revoke_user(id).await?;
        info!(user_id = %id, revoked, "user soft-deleted");
        Ok(())
    }
}
