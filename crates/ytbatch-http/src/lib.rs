//! ytbatch-http — HTTP `execute_batch` transport backed by `reqwest`.
//!
//! # Quick start
//! ```rust,no_run
//! use ytbatch_core::{BatchClient, SubRequest};
//! use ytbatch_http::HttpBatchClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpBatchClient::default_for("localhost:8000")?;
//! let client = BatchClient::new(transport);
//! let results = client.execute(vec![SubRequest::exists("//tmp")]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{HttpBatchClient, HttpClientConfig};
