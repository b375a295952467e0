//! SQLite helper utilities for type conversion
//!
//! SQLite doesn't natively support UUIDs or arrays. Ids are stored as TEXT
//! and genre lists as JSON strings.

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::store::StoreError;

// ============================================================================
// Id / timestamp helpers
// ============================================================================

/// Generate a new record id as a SQLite-compatible string
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ============================================================================
// Array/Vec Helpers (stored as JSON strings in SQLite)
// ============================================================================

/// Serialize a Vec to a JSON string for SQLite storage
#[inline]
pub fn vec_to_json<T: Serialize>(v: &[T]) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string())
}

/// Deserialize a JSON string from SQLite to a Vec
#[inline]
pub fn json_to_vec<T: DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}

// ============================================================================
// Query Building Helpers
// ============================================================================

/// Build a SQL fragment to check if a value exists in a JSON array column
pub fn json_array_contains_sql(column: &str) -> String {
    format!("EXISTS (SELECT 1 FROM json_each({}) WHERE value = ?)", column)
}

/// `?, ?, ?` for an `IN (...)` list
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ============================================================================
// Error mapping
// ============================================================================

/// Turn a UNIQUE constraint failure into [`StoreError::Duplicate`]
pub fn map_unique_violation(err: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate {
            field,
            value: value.to_string(),
        },
        _ => StoreError::Database(err),
    }
}
