//! The `BatchTransport` trait and the `BatchClient` built on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::codec::{decode_with, encode, DecodeOptions};
use crate::error::{BatchError, TransportError};
use crate::request::{BatchEnvelope, SubRequest};
use crate::response::BatchResults;

/// Delivers an envelope to a cluster and returns the raw result array.
///
/// Implementations own retries and timeouts. They must not reorder,
/// drop or pad results; `BatchClient` checks the length and treats any
/// mismatch as a protocol violation.
#[async_trait]
pub trait BatchTransport: Send + Sync + 'static {
    async fn submit_batch(&self, envelope: &BatchEnvelope) -> Result<Vec<Value>, TransportError>;

    /// Endpoint identifier (URL or name) for logs.
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: BatchTransport + ?Sized> BatchTransport for Arc<T> {
    async fn submit_batch(&self, envelope: &BatchEnvelope) -> Result<Vec<Value>, TransportError> {
        (**self).submit_batch(envelope).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Encode → submit → decode over any transport.
pub struct BatchClient<T> {
    transport: T,
    options: DecodeOptions,
}

impl<T: BatchTransport> BatchClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, options: DecodeOptions::default() }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute a batch. Per-item cluster errors come back inside `Ok`.
    pub async fn execute(&self, requests: Vec<SubRequest>) -> Result<BatchResults, BatchError> {
        if requests.is_empty() {
            return Ok(BatchResults::default());
        }

        let envelope = encode(requests);
        let span = tracing::debug_span!(
            "execute_batch",
            endpoint = %self.transport.endpoint(),
            size = envelope.len()
        );
        async {
            let raw = self.transport.submit_batch(&envelope).await?;
            let results = decode_with(raw, envelope.requests(), self.options)?;
            tracing::debug!(failed = results.failures().count(), "batch decoded");
            Ok::<_, BatchError>(results)
        }
        .instrument(span)
        .await
    }

    /// Execute a single sub-request and return its output.
    pub async fn execute_one(&self, request: SubRequest) -> Result<Value, BatchError> {
        let results = self.execute(vec![request]).await?;
        match results.into_items().pop() {
            Some(item) => item.into_output(),
            None => Err(BatchError::LengthMismatch { expected: 1, actual: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every sub-request from a canned list and records envelopes.
    struct MockTransport {
        responses: Mutex<Vec<Vec<Value>>>,
        seen: Mutex<Vec<Value>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Vec<Value>>) -> Self {
            Self { responses: Mutex::new(responses), seen: Mutex::new(vec![]) }
        }
    }

    #[async_trait]
    impl BatchTransport for MockTransport {
        async fn submit_batch(
            &self,
            envelope: &BatchEnvelope,
        ) -> Result<Vec<Value>, TransportError> {
            self.seen.lock().unwrap().push(serde_json::to_value(envelope)?);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(TransportError::Other("no canned response".into()));
            }
            Ok(responses.remove(0))
        }

        fn endpoint(&self) -> &str {
            "mock"
        }
    }

    /// Echoes each request's path back as its output, in order.
    struct EchoTransport;

    #[async_trait]
    impl BatchTransport for EchoTransport {
        async fn submit_batch(
            &self,
            envelope: &BatchEnvelope,
        ) -> Result<Vec<Value>, TransportError> {
            let wire = serde_json::to_value(envelope)?;
            Ok(wire["requests"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|r| json!({"output": r["parameters"]["path"].clone()}))
                .collect())
        }

        fn endpoint(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn execute_pairs_results_by_position() {
        let transport = MockTransport::new(vec![vec![
            json!({"error": {"message": "no such node"}}),
            json!({"output": false}),
        ]]);
        let client = BatchClient::new(transport);
        let results = client
            .execute(vec![SubRequest::get("//tmp/a"), SubRequest::exists("//tmp/b")])
            .await
            .unwrap();
        assert_eq!(results.get(0).unwrap().error().unwrap().message, "no such node");
        assert_eq!(results.get(1).unwrap().output(), Some(&json!(false)));

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0]["requests"][0]["command"], "get");
        assert_eq!(seen[0]["requests"][1]["command"], "exists");
    }

    #[tokio::test]
    async fn execute_surfaces_length_mismatch() {
        let client = BatchClient::new(MockTransport::new(vec![vec![json!({"output": 1})]]));
        let err = client
            .execute(vec![SubRequest::get("//tmp/a"), SubRequest::exists("//tmp/b")])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn execute_maps_transport_errors() {
        let client = BatchClient::new(MockTransport::new(vec![]));
        let err = client.execute(vec![SubRequest::get("//a")]).await.unwrap_err();
        assert!(matches!(err, BatchError::Transport(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn empty_batch_skips_transport() {
        let client = BatchClient::new(MockTransport::new(vec![]));
        let results = client.execute(vec![]).await.unwrap();
        assert!(results.is_empty());
        assert!(client.transport().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn execute_one_returns_output_or_item_error() {
        let client = BatchClient::new(MockTransport::new(vec![
            vec![json!({"output": ["x", "y"]})],
            vec![json!({"error": {"code": 901, "message": "denied"}})],
        ]));
        let out = client.execute_one(SubRequest::list("//home")).await.unwrap();
        assert_eq!(out, json!(["x", "y"]));

        let err = client.execute_one(SubRequest::list("//secret")).await.unwrap_err();
        assert!(matches!(
            err,
            BatchError::ItemFailed { index: 0, command: CommandKind::List, .. }
        ));
    }

    #[tokio::test]
    async fn strict_client_rejects_bad_shapes() {
        let client = BatchClient::new(MockTransport::new(vec![vec![json!({"output": "yes"})]]))
            .with_options(DecodeOptions::strict());
        let err = client.execute(vec![SubRequest::exists("//a")]).await.unwrap_err();
        assert!(matches!(err, BatchError::OutputShapeMismatch { .. }));
    }

    #[tokio::test]
    async fn concurrent_batches_keep_their_order() {
        let client = Arc::new(BatchClient::new(Arc::new(EchoTransport)));
        let tasks = (0..16).map(|i| {
            let client = client.clone();
            async move {
                let paths: Vec<String> = (0..5).map(|j| format!("//tmp/{i}/{j}")).collect();
                let requests = paths.iter().map(SubRequest::exists).collect();
                let results = client.execute(requests).await.unwrap();
                let outputs = results.into_outputs().unwrap();
                (paths, outputs)
            }
        });
        for (paths, outputs) in futures::future::join_all(tasks).await {
            let outputs: Vec<String> =
                outputs.into_iter().map(|v| v.as_str().unwrap().to_string()).collect();
            assert_eq!(paths, outputs);
        }
    }
}
