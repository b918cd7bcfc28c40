use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenPair},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        sessions::{RefreshSession, SessionRegistry},
    },
    error::{AppError, AppResult, AuthError},
    users::{
        dto::PublicUser,
        repo_types::{NewUser, Role, User},
        store::AccountStore,
    },
    validation::{is_valid_email, normalize_email, required},
};

/// Registration, login, refresh rotation and logout.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionRegistry>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionRegistry>,
        keys: JwtKeys,
    ) -> Self {
        Self {
            accounts,
            sessions,
            keys,
        }
    }

    /// Create a user and its profile in one transaction.
    #[instrument(skip(self, req))]
    pub async fn register(&self, req: RegisterRequest) -> AppResult<PublicUser> {
        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::validation("invalid email"));
        }
        let full_name = required("full_name", &req.full_name)?.to_string();
        required("password", &req.password)?;
        let role: Role = req.role.parse()?;

        let password_hash = hash_password_blocking(req.password).await?;
        let (user, profile) = self
            .accounts
            .create_with_profile(NewUser {
                full_name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    warn!("email already registered");
                }
                e
            })?;

        info!(user_id = %user.id, profile_id = %profile.id, role = %user.role, "user registered");
        Ok(PublicUser::from(user))
    }

    /// Check credentials and open a refresh session.
    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> AppResult<TokenPair> {
        let email = normalize_email(&req.email);
        required("email", &email)?;
        required("password", &req.password)?;

        let user = match self.accounts.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let (pair, session) = self.mint(&user)?;
        self.sessions.save(session).await?;

        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Trade a live refresh token for a new pair. The presented token is
    /// consumed: a second call with it fails with `SessionNotFound`.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.keys.verify_refresh(refresh_token)?;
        let session = self.sessions.find_by_token(refresh_token).await?;
        if session.user_id != claims.sub {
            warn!(session_id = %session.id, "refresh token subject does not match session");
            return Err(AuthError::InvalidToken.into());
        }

        let user = match self.accounts.find_by_id(session.user_id).await? {
            Some(u) => u,
            None => {
                warn!(user_id = %session.user_id, "refresh for missing user");
                self.sessions.delete(refresh_token).await?;
                return Err(AuthError::UserNotFound.into());
            }
        };

        let (pair, next) = self.mint(&user)?;
        self.sessions.rotate(refresh_token, next).await?;

        info!(user_id = %user.id, "refresh token rotated");
        Ok(pair)
    }

    /// Revoke a refresh token. Unknown tokens are not an error.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        self.sessions.delete(refresh_token).await?;
        info!("refresh session revoked");
        Ok(())
    }

    fn mint(&self, user: &User) -> AppResult<(TokenPair, RefreshSession)> {
        let access_token = self.keys.sign_access(user)?;
        let refresh_token = self.keys.sign_refresh(user.id)?;
        let session = RefreshSession::new(user.id, refresh_token.clone(), self.keys.refresh_ttl);
        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            session,
        ))
    }
}
