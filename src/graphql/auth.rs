//! GraphQL authentication
//!
//! Resolves the bearer token of an incoming operation to a [`CurrentUser`]
//! before any resolver runs, and provides [`AuthExt`] for resolvers to read it.
//!
//! A missing or non-bearer `Authorization` header always means an anonymous
//! request. A bearer token that fails to verify is treated according to
//! [`AuthMode`]: ignored in lenient mode, rejected with `UNAUTHENTICATED` in
//! strict mode.
//!
//! ## Guards
//!
//! `MutationGuard` protects the library writes when
//! `REQUIRE_AUTH_FOR_MUTATIONS` is enabled:
//!
//! ```ignore
//! #[graphql(guard = "MutationGuard")]
//! async fn add_book(&self, ctx: &Context<'_>, ...) -> Result<Option<Book>> { ... }
//! ```

use std::sync::Arc;

use async_graphql::{Context, Data, Pos, Request, Response, Result};

use crate::services::{AuthError, AuthMode, AuthService};
use crate::store::UserRecord;

use super::helpers::{internal_error, unauthenticated};

/// The user an operation runs as, inserted into the request data
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

/// Extension trait to get the current user from GraphQL context
pub trait AuthExt {
    /// The current user, or None for anonymous requests
    fn current_user(&self) -> Option<&UserRecord>;

    /// The current user, or an `UNAUTHENTICATED` error
    fn require_user(&self) -> Result<&UserRecord>;
}

impl<'a> AuthExt for Context<'a> {
    fn current_user(&self) -> Option<&UserRecord> {
        self.data_opt::<CurrentUser>().map(|u| &u.0)
    }

    fn require_user(&self) -> Result<&UserRecord> {
        self.current_user()
            .ok_or_else(|| unauthenticated("not authenticated"))
    }
}

/// Requires a current user when the server is configured to protect writes.
pub struct MutationGuard;

impl async_graphql::Guard for MutationGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let required = ctx
            .data_opt::<Arc<AuthService>>()
            .map(|auth| auth.config().require_auth_for_mutations)
            .unwrap_or(false);
        let result = if required {
            ctx.require_user().map(|_| ())
        } else {
            Ok(())
        };
        async move { result }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve an optional `Authorization` value to a user.
///
/// Returns `Ok(None)` for anonymous requests, and for invalid tokens in
/// lenient mode.
pub async fn resolve_user(auth: &AuthService, header: Option<&str>) -> Result<Option<UserRecord>> {
    let Some(token) = bearer_token(header) else {
        return Ok(None);
    };

    match auth.authenticate(token).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "Request authenticated");
            Ok(Some(user))
        }
        Err(AuthError::Store(e)) => Err(internal_error(e)),
        Err(e) => {
            tracing::debug!(error = %e, "Token verification failed");
            match auth.config().mode {
                AuthMode::Lenient => Ok(None),
                AuthMode::Strict => Err(unauthenticated("invalid or expired token")),
            }
        }
    }
}

/// Attach the current user to `request`, or produce the error response that
/// should be returned instead of executing it.
pub async fn prepare_request(
    auth: &AuthService,
    header: Option<&str>,
    request: Request,
) -> std::result::Result<Request, Response> {
    match resolve_user(auth, header).await {
        Ok(Some(user)) => Ok(request.data(CurrentUser(user))),
        Ok(None) => Ok(request),
        Err(e) => Err(Response::from_errors(vec![e.into_server_error(Pos::default())])),
    }
}

/// Connection data for a WebSocket session. The `connection_init` payload's
/// `Authorization` entry takes precedence over the upgrade request header.
pub async fn connection_data(
    auth: &AuthService,
    header: Option<&str>,
    payload: &serde_json::Value,
) -> Result<Data> {
    // Clients may send the bare token here
    let from_payload = payload
        .get("Authorization")
        .or_else(|| payload.get("authorization"))
        .and_then(|v| v.as_str())
        .map(|v| {
            if v.starts_with("Bearer ") {
                v.to_string()
            } else {
                format!("Bearer {}", v)
            }
        });

    let mut data = Data::default();
    if let Some(user) = resolve_user(auth, from_payload.as_deref().or(header)).await? {
        data.insert(CurrentUser(user));
    }
    Ok(data)
}
