//! Error types for the batch codec, transports and configuration.

use thiserror::Error;

use crate::command::{CommandKind, OutputShape};
use crate::response::ClusterError;

/// Errors raised while building, decoding or executing a batch.
///
/// Per-item cluster errors are *not* represented here: they come back as
/// failed [`ResultItem`](crate::ResultItem)s inside a successful decode.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The response carries a different number of items than the request.
    #[error("protocol violation: sent {expected} sub-requests but received {actual} results")]
    LengthMismatch { expected: usize, actual: usize },

    /// A raw result item is not a `{error?, output?}` object.
    #[error("protocol violation: malformed result at index {index}: {reason}")]
    MalformedItem { index: usize, reason: String },

    /// Strict validation: the output type does not match the command.
    #[error("result {index} ({command}): expected {expected} output, got {actual}")]
    OutputShapeMismatch {
        index: usize,
        command: CommandKind,
        expected: OutputShape,
        actual: &'static str,
    },

    /// A typed accessor was used on a failed item.
    #[error("sub-request {index} ({command}) failed: {error}")]
    ItemFailed {
        index: usize,
        command: CommandKind,
        #[source]
        error: ClusterError,
    },

    /// Nested decoding was requested for a command that is not `execute_batch`.
    #[error("result {index} is a {command} result, not a nested batch")]
    NotABatch { index: usize, command: CommandKind },

    /// The transport failed to deliver the envelope or its response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while submitting an envelope.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, reset, TLS failure and friends.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The proxy rejected the whole batch with a cluster error.
    #[error("cluster rejected batch: {0}")]
    Cluster(ClusterError),

    /// Request timed out after the configured duration.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response body is not a JSON array of results.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors from parsing a wire sub-request into a [`Command`](crate::Command).
#[derive(Debug, Error)]
pub enum ParseCommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("invalid parameters for `{command}`: {source}")]
    InvalidParameters {
        command: CommandKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from loading or validating cluster configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cluster `{0}` is not configured")]
    UnknownCluster(String),

    #[error("cluster entry `{key}` declares id `{id}`")]
    IdMismatch { key: String, id: String },

    #[error("cluster `{0}` has an empty proxy")]
    EmptyProxy(String),
}
