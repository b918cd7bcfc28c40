use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// The two fixed roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SE")]
    Se,
    #[serde(rename = "SCE")]
    Sce,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Se => "SE",
            Role::Sce => "SCE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SE" => Ok(Role::Se),
            "SCE" => Ok(Role::Sce),
            other => Err(AppError::validation(format!(
                "role must be one of SE, SCE (got {other:?})"
            ))),
        }
    }
}

/// Row as stored in `users`.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

/// User record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<Role>()
            .map_err(|e| anyhow::anyhow!("user {} has a corrupt role: {e}", r.id))?;
        Ok(Self {
            id: r.id,
            full_name: r.full_name,
            email: r.email,
            password_hash: r.password_hash,
            role,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        })
    }
}

/// Input for a user insert; email is already normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    /// Merge onto `user`; blank strings count as omitted.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.full_name.filter(|v| !v.trim().is_empty()) {
            user.full_name = name.trim().to_string();
        }
        if let Some(email) = self.email.filter(|v| !v.trim().is_empty()) {
            user.email = crate::validation::normalize_email(&email);
        }
        if let Some(hash) = self.password_hash.filter(|v| !v.trim().is_empty()) {
            user.password_hash = hash;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            full_name: "Ann Lee".into(),
            email: "ann@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            role: Role::Se,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("SE".parse::<Role>().unwrap(), Role::Se);
        assert_eq!("SCE".parse::<Role>().unwrap(), Role::Sce);
        assert!(matches!("admin".parse::<Role>(), Err(AppError::Validation(_))));
        assert_eq!(serde_json::to_string(&Role::Sce).unwrap(), "\"SCE\"");
    }

    #[test]
    fn patch_keeps_omitted_and_blank_fields() {
        let mut user = sample();
        let before = user.clone();
        UserPatch {
            full_name: Some("   ".into()),
            email: None,
            password_hash: Some(String::new()),
            role: Some(Role::Sce),
        }
        .apply(&mut user);

        assert_eq!(user.full_name, before.full_name);
        assert_eq!(user.email, before.email);
        assert_eq!(user.password_hash, before.password_hash);
        assert_eq!(user.role, Role::Sce);
    }

    #[test]
    fn patch_normalizes_email() {
        let mut user = sample();
        UserPatch {
            email: Some("  New@Example.COM ".into()),
            ..Default::default()
        }
        .apply(&mut user);
        assert_eq!(user.email, "new@example.com");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }
}
