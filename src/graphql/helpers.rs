// Error helpers shared across GraphQL query/mutation modules.

use std::fmt::Display;

use async_graphql::{Error, ErrorExtensions, Value};

pub(crate) const BAD_USER_INPUT: &str = "BAD_USER_INPUT";
pub(crate) const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
pub(crate) const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// A failed write caused by the arguments: validation, duplicates, or any store
/// failure during a mutation. `invalid_args` echoes the offending argument.
pub(crate) fn user_input_error(
    message: &str,
    invalid_args: impl Into<Value>,
    source: impl Display,
) -> Error {
    let invalid_args = invalid_args.into();
    let source = source.to_string();
    tracing::debug!(error = %source, "{}", message);
    Error::new(message).extend_with(move |_, e| {
        e.set("code", BAD_USER_INPUT);
        e.set("invalidArgs", invalid_args);
        e.set("error", source);
    })
}

pub(crate) fn unauthenticated(message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", UNAUTHENTICATED))
}

/// Store failure while reading; the cause is logged, not returned
pub(crate) fn internal_error(source: impl Display) -> Error {
    tracing::error!(error = %source, "Query failed");
    Error::new("internal server error").extend_with(|_, e| e.set("code", INTERNAL_SERVER_ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extension(err: &Error, key: &str) -> Option<Value> {
        err.extensions.as_ref().and_then(|ext| ext.get(key).cloned())
    }

    #[test]
    fn test_user_input_error_extensions() {
        let err = user_input_error("Saving book failed", "Clean Code", "title already exists");
        assert_eq!(err.message, "Saving book failed");
        assert_eq!(extension(&err, "code"), Some(Value::from(BAD_USER_INPUT)));
        assert_eq!(extension(&err, "invalidArgs"), Some(Value::from("Clean Code")));
        assert_eq!(
            extension(&err, "error"),
            Some(Value::from("title already exists"))
        );
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let err = internal_error("disk I/O error");
        assert_eq!(err.message, "internal server error");
        assert_eq!(extension(&err, "code"), Some(Value::from(INTERNAL_SERVER_ERROR)));
    }
}
