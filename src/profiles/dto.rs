use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::profiles::repo_types::Profile;
use crate::users::repo_types::Role;
use crate::validation::{is_valid_email, normalize_email, required};

/// Body of profile create and update calls. Every field is required; an
/// update replaces the whole row.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl ProfileRequest {
    pub fn into_profile(self, id: Uuid) -> AppResult<Profile> {
        let full_name = required("full_name", &self.full_name)?.to_string();
        let email = normalize_email(&self.email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("invalid email"));
        }
        Ok(Profile {
            id,
            user_id: self.user_id,
            full_name,
            email,
            role: self.role.parse::<Role>()?,
        })
    }
}
