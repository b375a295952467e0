//! Application services: authentication, change events and the long-running
//! components managed by [`ServicesManager`]

pub mod auth;
pub mod events;
pub mod http_server;
pub mod manager;
pub mod store;

pub use auth::{AuthConfig, AuthError, AuthMode, AuthService, TokenClaims, TokenService};
pub use events::{LibraryEvent, LibraryEvents};
pub use http_server::HttpServerService;
pub use manager::{HealthStatus, Service, ServiceHealth, ServicesManager};
pub use store::StoreService;
