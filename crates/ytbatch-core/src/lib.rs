//! ytbatch-core — typed `execute_batch` protocol for cluster proxies.
//!
//! # Overview
//!
//! A batch bundles many independent cluster commands (`get`, `exists`,
//! `copy`, `merge`, `check_permission`, nested `execute_batch`, ...) into
//! one network call. The response carries one result per command, at the
//! same position. The core crate defines:
//!
//! - [`Command`] — closed sum type, one variant per command with its
//!   parameter record
//! - [`SubRequest`] / [`BatchEnvelope`] — wire types for the request side
//! - [`ResultItem`] / [`BatchResults`] — per-command outcomes
//! - [`codec`] module — the positional `encode` / `decode` pair
//! - [`BatchTransport`] / [`BatchClient`] — transport seam and the client
//!   that drives encode → submit → decode
//! - [`config`] module — read-only cluster configuration
//! - [`policy`] module — retry with exponential backoff
//!
//! # Example
//! ```rust
//! use serde_json::json;
//! use ytbatch_core::{codec, SubRequest};
//!
//! let requests = vec![SubRequest::get("//tmp/a"), SubRequest::exists("//tmp/b")];
//! let envelope = codec::encode(requests);
//!
//! let raw = vec![json!({"output": {"value": 1}}), json!({"output": false})];
//! let results = codec::decode(raw, envelope.requests()).unwrap();
//! assert_eq!(results.len(), 2);
//! assert!(results.iter().all(|item| item.is_ok()));
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod policy;
pub mod request;
pub mod response;
pub mod transport;

pub use codec::{decode, decode_with, encode, DecodeOptions, Validation};
pub use command::{Command, CommandKind, OutputShape};
pub use config::{ClusterConfig, YtConfig};
pub use error::{BatchError, ConfigError, ParseCommandError, TransportError};
pub use request::{BatchEnvelope, SubRequest};
pub use response::{BatchResults, ClusterError, ResultItem};
pub use transport::{BatchClient, BatchTransport};
