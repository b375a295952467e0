//! Application configuration management

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use tracing::warn;

use crate::services::auth::{AuthConfig, AuthMode};

/// Which [`LibraryStore`](crate::store::LibraryStore) implementation to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackendKind {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}', expected sqlite or memory", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{}', expected json or pretty", other)),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    pub store_backend: StoreBackendKind,

    /// SQLite connection URL, unused by the memory backend
    pub database_url: String,

    pub database_max_connections: u32,

    /// How long to keep retrying the initial database connection
    pub database_connect_timeout: Duration,

    /// Seed the sample library when the store is empty
    pub seed_sample_data: bool,

    /// JWT secret for signing and verifying session tokens
    pub jwt_secret: String,

    /// The shared password every user logs in with
    pub login_password: String,

    pub token_ttl_seconds: Option<i64>,

    pub auth_mode: AuthMode,

    pub require_auth_for_mutations: bool,

    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("store_backend", &self.store_backend)
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("seed_sample_data", &self.seed_sample_data)
            .field("jwt_secret", &"<redacted>")
            .field("login_password", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("auth_mode", &self.auth_mode)
            .field("require_auth_for_mutations", &self.require_auth_for_mutations)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {}", key)),
        None => Ok(default),
    }
}

fn flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "true" || v == "1"
        })
        .unwrap_or(default)
}

pub fn generate_jwt_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup. Empty values count as unset.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| source(key).filter(|v| !v.trim().is_empty());

        let store_backend = parse_or(get("STORE_BACKEND"), "STORE_BACKEND", StoreBackendKind::Sqlite)?;

        // A persistent store outlives the process, so its tokens need a stable secret
        let jwt_secret = match (get("JWT_SECRET"), store_backend) {
            (Some(secret), _) => secret,
            (None, StoreBackendKind::Memory) => {
                warn!("JWT_SECRET not set; generated a random secret, tokens will not survive a restart");
                generate_jwt_secret()
            }
            (None, StoreBackendKind::Sqlite) => {
                bail!("JWT_SECRET is required when STORE_BACKEND=sqlite")
            }
        };

        let token_ttl_seconds = match get("TOKEN_TTL_SECONDS") {
            Some(raw) => {
                let ttl: i64 = raw.trim().parse().context("Invalid TOKEN_TTL_SECONDS")?;
                if ttl <= 0 {
                    bail!("TOKEN_TTL_SECONDS must be positive");
                }
                Some(ttl)
            }
            None => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: parse_or(get("PORT"), "PORT", 4000)?,

            store_backend,

            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:library.db?mode=rwc".to_string()),

            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                5,
            )?,

            database_connect_timeout: Duration::from_secs(parse_or(
                get("DATABASE_CONNECT_TIMEOUT_SECONDS"),
                "DATABASE_CONNECT_TIMEOUT_SECONDS",
                30,
            )?),

            seed_sample_data: flag(
                get("SEED_SAMPLE_DATA"),
                store_backend == StoreBackendKind::Memory,
            ),

            jwt_secret,

            login_password: get("LOGIN_PASSWORD").unwrap_or_else(|| "secret".to_string()),

            token_ttl_seconds,

            auth_mode: parse_or(get("AUTH_MODE"), "AUTH_MODE", AuthMode::Lenient)?,

            require_auth_for_mutations: flag(get("REQUIRE_AUTH_FOR_MUTATIONS"), false),

            log_format: parse_or(get("LOG_FORMAT"), "LOG_FORMAT", LogFormat::Json)?,
        })
    }

    /// Socket address to bind the HTTP server to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid HOST/PORT: {}:{}", self.host, self.port))
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            login_password: self.login_password.clone(),
            token_ttl_seconds: self.token_ttl_seconds,
            mode: self.auth_mode,
            require_auth_for_mutations: self.require_auth_for_mutations,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", "s3cr3t")]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.store_backend, StoreBackendKind::Sqlite);
        assert_eq!(config.database_url, "sqlite:library.db?mode=rwc");
        assert_eq!(config.database_max_connections, 5);
        assert!(!config.seed_sample_data);
        assert_eq!(config.login_password, "secret");
        assert_eq!(config.token_ttl_seconds, None);
        assert_eq!(config.auth_mode, AuthMode::Lenient);
        assert!(!config.require_auth_for_mutations);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr().unwrap().port(), 4000);
    }

    #[test]
    fn test_sqlite_requires_secret() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
        assert!(load(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_memory_generates_secret_and_seeds() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert!(!config.jwt_secret.is_empty());
        assert!(config.seed_sample_data);

        let other = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_ne!(config.jwt_secret, other.jwt_secret);

        let unseeded = load(&[("STORE_BACKEND", "memory"), ("SEED_SAMPLE_DATA", "false")]).unwrap();
        assert!(!unseeded.seed_sample_data);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s3cr3t"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("TOKEN_TTL_SECONDS", "3600"),
            ("AUTH_MODE", "strict"),
            ("REQUIRE_AUTH_FOR_MUTATIONS", "1"),
            ("LOG_FORMAT", "pretty"),
            ("LOGIN_PASSWORD", "hunter2"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_ttl_seconds, Some(3600));
        assert_eq!(config.log_format, LogFormat::Pretty);

        let auth = config.auth_config();
        assert_eq!(auth.mode, AuthMode::Strict);
        assert!(auth.require_auth_for_mutations);
        assert_eq!(auth.login_password, "hunter2");
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("JWT_SECRET", "x"), ("PORT", "eighty")]).is_err());
        assert!(load(&[("JWT_SECRET", "x"), ("AUTH_MODE", "open")]).is_err());
        assert!(load(&[("JWT_SECRET", "x"), ("STORE_BACKEND", "postgres")]).is_err());
        assert!(load(&[("JWT_SECRET", "x"), ("TOKEN_TTL_SECONDS", "0")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&[("JWT_SECRET", "very-private-value")]).unwrap();
        assert!(!format!("{:?}", config).contains("very-private-value"));
    }
}
