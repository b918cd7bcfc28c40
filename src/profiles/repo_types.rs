use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

/// Display copy of a user's identity, addressable by its own id or by user id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl Profile {
    /// Snapshot of `user` taken at registration. Later edits to either side
    /// do not propagate.
    pub fn mirror_of(user: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|e| anyhow::anyhow!("profile {} has a corrupt role: {e}", r.id))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            full_name: r.full_name,
            email: r.email,
            role,
        })
    }
}
