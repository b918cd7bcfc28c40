use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::auth::{
    jwt::JwtKeys,
    services::AuthService,
    session_repo::PgSessionRegistry,
    sessions::{MemorySessionRegistry, SessionRegistry},
};
use crate::config::{AppConfig, SessionBackend};
use crate::db;
use crate::users::{repo::PgAccountStore, services::UserService, store::AccountStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub auth: AuthService,
    pub users: UserService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;

        let accounts = Arc::new(PgAccountStore::new(db.clone())) as Arc<dyn AccountStore>;
        let sessions = match config.session_backend {
            SessionBackend::Postgres => {
                Arc::new(PgSessionRegistry::new(db.clone())) as Arc<dyn SessionRegistry>
            }
            SessionBackend::Memory => {
                Arc::new(MemorySessionRegistry::new()) as Arc<dyn SessionRegistry>
            }
        };
        info!(backend = ?config.session_backend, "refresh session registry ready");

        Ok(Self::from_parts(db, config, accounts, sessions))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Self {
        let jwt = JwtKeys::from_config(&config.jwt);
        let auth = AuthService::new(accounts.clone(), sessions.clone(), jwt.clone());
        let users = UserService::new(accounts, sessions);
        Self {
            db,
            config,
            jwt,
            auth,
            users,
        }
    }
}
