//! HTTP service client and chunked request streaming for hapi-stream.
//!
//! This crate provides the request side of the pipeline:
//!
//! - [`url::query_url`] - Builds readable HAPI request URLs
//! - [`HapiService`] - reqwest client with typed protocol errors
//! - [`DataService`] - The seam the chunk streamer talks to
//! - [`ChunkStreamer`] - Bisects oversized requests into a single lazy stream
//! - [`ChunkProgress`] - Chunk count, limit and truncation status

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hapi-stream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chunk;
mod client;
mod progress;
pub mod url;

pub use chunk::{ChunkStreamer, ChunkedStream, DEFAULT_CHUNK_LIMIT};
pub use client::{ByteStream, ClientConfig, ContentCoding, DataService, HapiService};
pub use progress::{ChunkProgress, LimitCallback, QueryStatus};
pub use reqwest::Url;
