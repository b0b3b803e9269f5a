//! Positional batch codec.
//!
//! `encode` wraps sub-requests into an envelope without touching their order.
//! `decode` zips the raw response array back onto the original requests:
//! result `i` always belongs to request `i`. A length mismatch or a
//! non-object item is a protocol violation and fails the whole call; cluster
//! errors on individual items do not, even when the descriptor is malformed.

use serde_json::Value;

use crate::command::json_type;
use crate::error::BatchError;
use crate::request::{BatchEnvelope, SubRequest};
use crate::response::{BatchResults, ClusterError, RawResultItem, ResultItem};

/// How far `decode` checks outputs against each command's expected shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Accept any output. Items are only checked to be `{error?, output?}`.
    #[default]
    Lenient,
    /// Fail the decode when a successful output has the wrong JSON type.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub validation: Validation,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self { validation: Validation::Strict }
    }
}

/// Bundle sub-requests into one envelope, in the given order.
pub fn encode(requests: Vec<SubRequest>) -> BatchEnvelope {
    tracing::debug!(count = requests.len(), "encoded batch envelope");
    BatchEnvelope::new(requests)
}

/// Pair raw results with their requests using lenient validation.
pub fn decode(
    raw_results: Vec<Value>,
    requests: &[SubRequest],
) -> Result<BatchResults, BatchError> {
    decode_with(raw_results, requests, DecodeOptions::default())
}

pub fn decode_with(
    raw_results: Vec<Value>,
    requests: &[SubRequest],
    options: DecodeOptions,
) -> Result<BatchResults, BatchError> {
    if raw_results.len() != requests.len() {
        return Err(BatchError::LengthMismatch {
            expected: requests.len(),
            actual: raw_results.len(),
        });
    }

    let mut items = Vec::with_capacity(requests.len());
    for (index, (raw, request)) in raw_results.into_iter().zip(requests).enumerate() {
        let item = decode_item(index, request, raw)?;
        match &item.outcome {
            Err(error) => {
                tracing::warn!(
                    index,
                    command = %item.command,
                    code = error.code,
                    message = %error.message,
                    "sub-request failed"
                );
            }
            Ok(output) if options.validation == Validation::Strict => {
                let expected = item.command.expected_output();
                if !expected.matches(output) {
                    return Err(BatchError::OutputShapeMismatch {
                        index,
                        command: item.command,
                        expected,
                        actual: json_type(output),
                    });
                }
            }
            Ok(_) => {}
        }
        items.push(item);
    }
    Ok(BatchResults::new(items))
}

fn decode_item(index: usize, request: &SubRequest, raw: Value) -> Result<ResultItem, BatchError> {
    if !raw.is_object() {
        return Err(BatchError::MalformedItem {
            index,
            reason: format!("expected object, got {}", json_type(&raw)),
        });
    }
    let raw: RawResultItem = serde_json::from_value(raw).map_err(|e| BatchError::MalformedItem {
        index,
        reason: e.to_string(),
    })?;

    // error wins over output; a bare `{}` is a success without output
    let outcome = match raw.error {
        Some(error) => Err(ClusterError::from_wire(error)),
        None => Ok(raw.output.unwrap_or(Value::Null)),
    };
    Ok(ResultItem { index, command: request.kind(), outcome })
}
