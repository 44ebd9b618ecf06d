//! Error types for the client.

use thiserror::Error;

/// Placeholder used when the platform omits `message` or `detail` in an error payload.
pub const EMPTY_PLACEHOLDER: &str = "<empty>";

/// Errors raised while building queries, talking to the platform or decoding its responses.
#[derive(Debug, Error)]
pub enum Error {
    /// A public method received an argument of the wrong shape.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// A query operand was not one of the types the operator accepts.
    #[error("invalid type passed to {operation}(), expected: {expected}, got: {actual}")]
    QueryTypeError {
        operation: &'static str,
        expected: String,
        actual: &'static str,
    },

    /// A condition or render was attempted without an active field.
    #[error("{0}")]
    QueryMissingField(&'static str),

    /// A second condition was applied to a field before a logical operator.
    #[error("expected logical operator after expression")]
    QueryMultipleExpressions,

    /// A logical operator or render was attempted without a completed condition.
    #[error("{0}")]
    QueryExpressionError(&'static str),

    /// The builder was rendered before any condition was added.
    #[error("at least one condition is required")]
    QueryEmpty,

    /// The platform returned an `error` object instead of a result.
    #[error("Error in response. Message: {message}, Details: {detail}")]
    ResponseError { message: String, detail: String },

    /// The body had neither a `result` nor an `error` key at its root.
    #[error("the expected `result` key was missing in the response, cannot continue")]
    MissingResult,

    /// Zero records where at least one was expected.
    #[error("{0}")]
    NoResults(String),

    /// More than one record where exactly one was expected.
    #[error("{0}")]
    MultipleResults(String),

    /// The platform accepted the request but returned no usable body (HTTP 202).
    #[error("got no content for {0}")]
    EmptyContent(String),

    /// An OAuth client was used before a token was set.
    #[error("{0}")]
    MissingToken(String),

    /// The platform answered with a status code the client does not handle.
    #[error("{method} {url} failed with HTTP status {status}")]
    Http {
        method: String,
        url: String,
        status: u16,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response body was not valid JSON.
    #[error("malformed JSON at byte {offset}: {message}")]
    Json { offset: usize, message: String },

    /// A buffered body failed to parse, or a payload failed to serialize.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Builds a [`Error::ResponseError`] from a decoded `error` object.
    ///
    /// Missing, null or empty `message`/`detail` entries fall back to [`EMPTY_PLACEHOLDER`].
    pub fn from_error_payload(payload: &serde_json::Value) -> Self {
        let text = |key: &str| -> String {
            match payload.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                Some(serde_json::Value::Null) | None => EMPTY_PLACEHOLDER.to_string(),
                Some(serde_json::Value::String(_)) => EMPTY_PLACEHOLDER.to_string(),
                Some(other) => other.to_string(),
            }
        };

        Error::ResponseError {
            message: text("message"),
            detail: text("detail"),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
