//! Library Backend - GraphQL service for books, authors and users
//!
//! All operations are exposed via GraphQL at /graphql. The binary in
//! `main.rs` wires configuration, the store and the HTTP server together
//! through the [`ServicesManager`](services::ServicesManager).

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;
pub mod store;

pub use app::{AppState, build_app};
