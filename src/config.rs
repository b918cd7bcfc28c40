use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where refresh sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown SESSION_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session_backend: SessionBackend,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session_backend = match std::env::var("SESSION_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => SessionBackend::Postgres,
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "taskboard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "taskboard-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 7),
        };
        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            session_backend,
            jwt,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_backend_parses_known_names() {
        assert_eq!("memory".parse::<SessionBackend>().unwrap(), SessionBackend::Memory);
        assert_eq!(" Postgres ".parse::<SessionBackend>().unwrap(), SessionBackend::Postgres);
        assert!("redis".parse::<SessionBackend>().is_err());
    }

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("TASKBOARD_TEST_TTL", "not-a-number");
        assert_eq!(env_or("TASKBOARD_TEST_TTL", 42i64), 42);
        std::env::set_var("TASKBOARD_TEST_TTL", "7");
        assert_eq!(env_or("TASKBOARD_TEST_TTL", 42i64), 7);
    }
}
