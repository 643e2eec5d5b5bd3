//! Streaming client for HAPI time-series data servers.
//!
//! This is a facade crate that re-exports functionality from the hapi-stream
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use hapi_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let base = Url::parse("https://cdaweb.gsfc.nasa.gov/hapi/")?;
//!     let service = Arc::new(HapiService::with_defaults(base)?);
//!
//!     let url = service.create_query(
//!         HapiEndpoint::Data,
//!         &[
//!             ("dataset", "OMNI2_H0_MRG1HR"),
//!             ("parameters", "DST1800"),
//!             ("start", "2020-01-01T00:00Z"),
//!             ("stop", "2020-02-01T00:00Z"),
//!             ("include", "header"),
//!         ],
//!     )?;
//!     let mut table = HapiSource::new(service, url).open_table().await?;
//!     let rows = table.rows()?;
//!     while rows.next().await? {
//!         println!("{:?}", rows.row());
//!     }
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hapi-stream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use hapi_types::*;

// Re-export request side
#[cfg(feature = "fetch")]
pub use hapi_fetch::{
    ByteStream, ChunkProgress, ChunkStreamer, ChunkedStream, ClientConfig, ContentCoding,
    DEFAULT_CHUNK_LIMIT, DataService, HapiService, LimitCallback, QueryStatus, Url, url,
};

// Re-export decoding
#[cfg(feature = "table")]
pub use hapi_table::{
    ColumnInfo, ColumnReader, CsvDecoder, DataReader, HapiSource, HapiTable, RowReader,
    StreamHeader, Value, parse_header,
};

/// Prelude module for convenient imports.
///
/// ```
/// use hapi_lib::prelude::*;
/// ```
pub mod prelude {
    pub use hapi_types::{
        HapiEndpoint, HapiError, HapiInfo, HapiParam, HapiType, HapiVersion, RequestInterval,
        Result, StreamFormat, TimeBound,
    };

    #[cfg(feature = "fetch")]
    pub use hapi_fetch::{
        ChunkStreamer, ClientConfig, DataService, HapiService, LimitCallback, QueryStatus, Url,
    };

    #[cfg(feature = "table")]
    pub use hapi_table::{HapiSource, HapiTable, RowReader, Value};
}
