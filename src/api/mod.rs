//! API route definitions
//!
//! The primary API is GraphQL at /graphql. REST endpoints here cover
//! operational probes only.

pub mod health;
