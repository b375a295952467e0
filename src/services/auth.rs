//! Authentication service: login and session token handling
//!
//! Provides:
//! - Login against the shared server credential
//! - JWT token generation and validation (HS256)
//! - Resolving a bearer token back to a stored user
//!
//! Tokens are stateless. Nothing is stored server-side and there is no
//! revocation; when `TOKEN_TTL_SECONDS` is unset tokens carry no `exp` claim
//! and stay valid for as long as the signing secret does.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::store::{SharedStore, StoreError, UserRecord};

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub id: String,
    /// Username at the time of login
    pub username: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp, only present when a token lifetime is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password. Deliberately indistinguishable.
    #[error("wrong credentials")]
    WrongCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("token refers to a user that no longer exists")]
    UnknownUser,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Configuration
// ============================================================================

/// What to do with a bearer token that is present but does not verify
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Treat the request as anonymous
    #[default]
    Lenient,
    /// Reject the request before any resolver runs
    Strict,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(AuthMode::Lenient),
            "strict" => Ok(AuthMode::Strict),
            other => Err(format!("unknown auth mode '{}', expected lenient or strict", other)),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Lenient => write!(f, "lenient"),
            AuthMode::Strict => write!(f, "strict"),
        }
    }
}

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// The single password every user logs in with
    pub login_password: String,
    /// Token lifetime in seconds; `None` issues non-expiring tokens
    pub token_ttl_seconds: Option<i64>,
    pub mode: AuthMode,
    /// Require a current user for addBook, addAuthor and editAuthor
    pub require_auth_for_mutations: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("login_password", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("mode", &self.mode)
            .field("require_auth_for_mutations", &self.require_auth_for_mutations)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            login_password: "secret".to_string(),
            token_ttl_seconds: None,
            mode: AuthMode::Lenient,
            require_auth_for_mutations: false,
        }
    }
}

// ============================================================================
// Token Service
// ============================================================================

/// Signs and verifies session tokens with the server secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: Option<i64>,
}

impl TokenService {
    pub fn new(secret: &str, ttl_seconds: Option<i64>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Create a token for `user`
    pub fn sign(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            id: user.id.clone(),
            username: user.username.clone(),
            iat: now,
            exp: self.ttl_seconds.map(|ttl| now + ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// Decode and validate a token
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        if self.ttl_seconds.is_none() {
            // `exp` is optional without a TTL, but an expired one is still rejected
            validation.required_spec_claims.clear();
        }

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

// ============================================================================
// Auth Service
// ============================================================================

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    tokens: TokenService,
    config: AuthConfig,
    password_digest: [u8; 32],
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

impl AuthService {
    /// Create a new auth service
    pub fn new(store: SharedStore, config: AuthConfig) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl_seconds),
            password_digest: digest(&config.login_password),
            store,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Login with username and the shared password, returning a signed token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        // Usernames are stored trimmed
        let username = username.trim();
        let user = self.store.find_user_by_username(username).await?;

        // Compare fixed-size digests so the comparison doesn't leak the password length
        let password_ok = digest(password) == self.password_digest;

        let user = match user {
            Some(u) if password_ok => u,
            _ => {
                debug!(username = %username, "Login rejected");
                return Err(AuthError::WrongCredentials);
            }
        };

        let token = self.tokens.sign(&user)?;
        debug!(user_id = %user.id, "Login successful");
        Ok(token)
    }

    /// Verify a token and load the user it names
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.store
            .get_user(&claims.id)
            .await?
            .ok_or(AuthError::UnknownUser)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::store::{CreateUser, LibraryStore, MemoryStore};

    fn user() -> UserRecord {
        UserRecord {
            id: "7f2c1c2e-0000-4000-8000-000000000001".to_string(),
            username: "mluukkai".to_string(),
            favorite_genre: "refactoring".to_string(),
        }
    }

    async fn service_with_user(config: AuthConfig) -> (AuthService, UserRecord) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(CreateUser {
                username: "mluukkai".to_string(),
                favorite_genre: "refactoring".to_string(),
            })
            .await
            .unwrap();
        (AuthService::new(store, config), user)
    }

    #[test]
    fn test_sign_and_verify() {
        let tokens = TokenService::new("test-secret", None);
        let token = tokens.sign(&user()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, user().id);
        assert_eq!(claims.username, "mluukkai");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_token_with_ttl_has_exp() {
        let tokens = TokenService::new("test-secret", Some(3600));
        let claims = tokens.verify(&tokens.sign(&user()).unwrap()).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + 3600));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("test-secret", Some(-3600));
        let token = tokens.sign(&user()).unwrap();
        assert_matches!(tokens.verify(&token), Err(AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("one-secret", None).sign(&user()).unwrap();
        let other = TokenService::new("another-secret", None);
        assert_matches!(other.verify(&token), Err(AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = TokenService::new("test-secret", None);
        let token = tokens.sign(&user()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let sig = parts[2].clone();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{}{}", flipped, &sig[1..]);
        let tampered = parts.join(".");

        assert_matches!(tokens.verify(&tampered), Err(AuthError::InvalidToken(_)));
        assert_matches!(tokens.verify("not-a-token"), Err(AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_auth_mode_parse() {
        assert_eq!("strict".parse::<AuthMode>().unwrap(), AuthMode::Strict);
        assert_eq!(" Lenient ".parse::<AuthMode>().unwrap(), AuthMode::Lenient);
        assert!("open".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let rendered = format!("{:?}", AuthConfig::default());
        assert!(!rendered.contains("change-me-in-production"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_login_success_and_authenticate() {
        let (auth, user) = service_with_user(AuthConfig::default()).await;
        let token = auth.login("mluukkai", "secret").await.unwrap();

        let claims = auth.tokens().verify(&token).unwrap();
        assert_eq!(claims.id, user.id);

        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_login_wrong_password_or_unknown_user() {
        let (auth, _) = service_with_user(AuthConfig::default()).await;
        assert_matches!(
            auth.login("mluukkai", "wrong").await,
            Err(AuthError::WrongCredentials)
        );
        assert_matches!(
            auth.login("nobody", "secret").await,
            Err(AuthError::WrongCredentials)
        );
    }

    #[tokio::test]
    async fn test_login_with_padded_username() {
        let store = Arc::new(MemoryStore::new());
        let created = crate::store::add_user(
            store.as_ref(),
            CreateUser {
                username: " alice ".to_string(),
                favorite_genre: "fantasy".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.username, "alice");

        let auth = AuthService::new(store, AuthConfig::default());
        let token = auth.login(" alice ", "secret").await.unwrap();
        assert_eq!(auth.authenticate(&token).await.unwrap(), created);
        assert!(auth.login("alice", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (auth, _) = service_with_user(AuthConfig::default()).await;
        let token = auth.tokens().sign(&user()).unwrap();
        assert_matches!(auth.authenticate(&token).await, Err(AuthError::UnknownUser));
    }
}
