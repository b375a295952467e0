//! Application state and HTTP router construction.
//!
//! Used by [HttpServerService](crate::services::http_server::HttpServerService)
//! and by router tests to build the Axum app.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::graphql::LibrarySchema;
use crate::services::{AuthService, ServicesManager};
use crate::store::SharedStore;

/// Shared state for HTTP handlers (GraphQL, health routes).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub schema: LibrarySchema,
    pub store: SharedStore,
    pub auth: Arc<AuthService>,
    pub services: Arc<ServicesManager>,
}

/// Build the full Axum router: health routes, /graphql, /graphql/ws and layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(crate::api::health::router())
        .merge(crate::graphql::routes::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
