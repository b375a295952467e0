//! GraphQL API with subscriptions for real-time updates
//!
//! This module provides the library API using async-graphql, served over
//! HTTP POST at `/graphql` and over WebSocket at `/graphql/ws`.
//!
//! Queries and mutations are split by domain under `queries/` and
//! `mutations/`; each file defines a `#[derive(Default)]` struct with an
//! `#[Object]` impl and `schema.rs` merges them into `QueryRoot`/`MutationRoot`.

pub mod auth;
pub mod helpers;
pub mod loaders;
pub mod mutations;
pub mod queries;
pub mod routes;
mod schema;
mod subscriptions;
pub mod types;

pub use auth::{AuthExt, CurrentUser, MutationGuard, prepare_request};
pub use schema::{LibrarySchema, MutationRoot, QueryRoot, build_schema};
pub use subscriptions::SubscriptionRoot;
