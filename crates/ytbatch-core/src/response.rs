//! Response-side types: cluster errors and per-item results.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::codec::{decode_with, DecodeOptions};
use crate::command::{json_type, Command, CommandKind};
use crate::error::BatchError;
use crate::request::SubRequest;

/// Error descriptor returned by the cluster, possibly nesting its causes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub attributes: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub inner_errors: Vec<ClusterError>,
}

/// Explicit `null` reads as the field's default, same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ClusterError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Build an error from a wire descriptor. A descriptor that is not a
    /// well-formed error object is kept verbatim under `attributes["raw"]`.
    pub fn from_wire(raw: Value) -> Self {
        if let Ok(error) = ClusterError::deserialize(&raw) {
            return error;
        }
        let message = match &raw {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let mut attributes = Map::new();
        attributes.insert("raw".to_string(), raw);
        Self {
            message,
            attributes,
            ..Default::default()
        }
    }

    /// Depth-first search for an error (this one or a cause) with `code`.
    pub fn find_code(&self, code: i64) -> Option<&ClusterError> {
        if self.code == code {
            return Some(self);
        }
        self.inner_errors.iter().find_map(|inner| inner.find_code(code))
    }

    /// The deepest first cause, usually the most specific message.
    pub fn root_cause(&self) -> &ClusterError {
        match self.inner_errors.first() {
            Some(inner) => inner.root_cause(),
            None => self,
        }
    }
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ClusterError {}

/// Raw `{error?, output?}` item as it appears on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct RawResultItem {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
}

/// Outcome of the sub-request at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub index: usize,
    pub command: CommandKind,
    /// `Err` whenever the wire item carried an error, even next to an output.
    pub outcome: Result<Value, ClusterError>,
}

impl ResultItem {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn output(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ClusterError> {
        self.outcome.as_ref().err()
    }

    /// Successful output, or [`BatchError::ItemFailed`].
    pub fn into_output(self) -> Result<Value, BatchError> {
        let (index, command) = (self.index, self.command);
        self.outcome
            .map_err(|error| BatchError::ItemFailed { index, command, error })
    }

    /// Deserialize a successful output into `T`.
    pub fn output_as<T: DeserializeOwned>(&self) -> Result<T, BatchError> {
        match &self.outcome {
            Ok(value) => Ok(serde_json::from_value(value.clone())?),
            Err(error) => Err(BatchError::ItemFailed {
                index: self.index,
                command: self.command,
                error: error.clone(),
            }),
        }
    }

    /// Decode the output of an `execute_batch` item against its inner requests.
    pub fn nested(&self, request: &SubRequest) -> Result<BatchResults, BatchError> {
        self.nested_with(request, DecodeOptions::default())
    }

    pub fn nested_with(
        &self,
        request: &SubRequest,
        options: DecodeOptions,
    ) -> Result<BatchResults, BatchError> {
        let Command::ExecuteBatch(params) = &request.command else {
            return Err(BatchError::NotABatch { index: self.index, command: request.kind() });
        };
        let raw = match self.output_as::<Value>()? {
            Value::Array(raw) => raw,
            other => {
                let reason =
                    format!("nested batch output must be an array, got {}", json_type(&other));
                return Err(BatchError::MalformedItem { index: self.index, reason });
            }
        };
        decode_with(raw, &params.requests, options)
    }
}

impl Serialize for ResultItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResultItem", 1)?;
        match &self.outcome {
            Ok(output) => state.serialize_field("output", output)?,
            Err(error) => state.serialize_field("error", error)?,
        }
        state.end()
    }
}

/// Ordered results of one batch; item `i` belongs to sub-request `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResults {
    items: Vec<ResultItem>,
}

impl BatchResults {
    pub(crate) fn new(items: Vec<ResultItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultItem> {
        self.items.iter()
    }

    pub fn all_ok(&self) -> bool {
        self.items.iter().all(ResultItem::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.iter().filter(|item| item.is_err())
    }

    /// All outputs in order, or the first failed item as an error.
    pub fn into_outputs(self) -> Result<Vec<Value>, BatchError> {
        self.items.into_iter().map(ResultItem::into_output).collect()
    }

    pub fn into_items(self) -> Vec<ResultItem> {
        self.items
    }
}

impl IntoIterator for BatchResults {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResults {
    type Item = &'a ResultItem;
    type IntoIter = std::slice::Iter<'a, ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(index: usize, command: CommandKind, output: Value) -> ResultItem {
        ResultItem { index, command, outcome: Ok(output) }
    }

    #[test]
    fn cluster_error_defaults_missing_fields() {
        let err: ClusterError = serde_json::from_value(json!({"message": "no such node"})).unwrap();
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "no such node");
        assert!(err.inner_errors.is_empty());
    }

    #[test]
    fn cluster_error_accepts_null_fields() {
        let err: ClusterError = serde_json::from_value(json!({
            "code": 1,
            "message": "x",
            "attributes": null,
            "inner_errors": null
        }))
        .unwrap();
        assert_eq!(err, ClusterError::new(1, "x"));
    }

    #[test]
    fn from_wire_keeps_unparseable_descriptor() {
        let err = ClusterError::from_wire(json!("no such node"));
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "no such node");
        assert_eq!(err.attributes["raw"], json!("no such node"));

        let err = ClusterError::from_wire(json!({"code": "oops"}));
        assert_eq!(err.message, r#"{"code":"oops"}"#);
        assert_eq!(err.attributes["raw"], json!({"code": "oops"}));

        let parsed = ClusterError::from_wire(json!({"code": 500, "message": "missing"}));
        assert_eq!(parsed, ClusterError::new(500, "missing"));
    }

    #[test]
    fn find_code_searches_causes() {
        let err: ClusterError = serde_json::from_value(json!({
            "code": 1,
            "message": "Error resolving path",
            "inner_errors": [{"code": 500, "message": "Node //tmp/x has no child"}]
        }))
        .unwrap();
        assert_eq!(err.find_code(500).unwrap().message, "Node //tmp/x has no child");
        assert!(err.find_code(901).is_none());
        assert_eq!(err.root_cause().code, 500);
    }

    #[test]
    fn output_as_typed() {
        let item = ok(0, CommandKind::List, json!(["a", "b"]));
        let names: Vec<String> = item.output_as().unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn output_as_failed_item() {
        let item = ResultItem {
            index: 3,
            command: CommandKind::Get,
            outcome: Err(ClusterError::new(500, "no such node")),
        };
        let err = item.output_as::<Value>().unwrap_err();
        assert!(matches!(err, BatchError::ItemFailed { index: 3, command: CommandKind::Get, .. }));
    }

    #[test]
    fn nested_requires_execute_batch() {
        let item = ok(0, CommandKind::Get, json!([]));
        let err = item.nested(&SubRequest::get("//a")).unwrap_err();
        assert!(matches!(err, BatchError::NotABatch { index: 0, command: CommandKind::Get }));
    }

    #[test]
    fn nested_output_must_be_an_array() {
        let request = SubRequest::execute_batch(vec![SubRequest::exists("//a")]);
        let item = ok(2, CommandKind::ExecuteBatch, json!({"x": 1}));
        let err = item.nested(&request).unwrap_err();
        match err {
            BatchError::MalformedItem { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.contains("got object"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn item_serializes_as_either_or() {
        let failed = ResultItem {
            index: 0,
            command: CommandKind::Exists,
            outcome: Err(ClusterError::new(1, "boom")),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": {"code": 1, "message": "boom"}})
        );
        assert_eq!(
            serde_json::to_value(ok(1, CommandKind::Exists, json!(false))).unwrap(),
            json!({"output": false})
        );
    }

    #[test]
    fn into_outputs_stops_at_first_failure() {
        let results = BatchResults::new(vec![
            ok(0, CommandKind::Exists, json!(true)),
            ResultItem {
                index: 1,
                command: CommandKind::Get,
                outcome: Err(ClusterError::new(500, "missing")),
            },
        ]);
        assert_eq!(results.failures().count(), 1);
        let err = results.into_outputs().unwrap_err();
        assert!(matches!(err, BatchError::ItemFailed { index: 1, .. }));
    }
}
