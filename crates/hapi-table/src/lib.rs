//! Row decoding for hapi-stream data streams.
//!
//! This crate turns the byte stream of a data request into typed rows:
//!
//! - [`CsvDecoder`] - Tolerant RFC 4180 row splitter
//! - [`parse_header`] - Optional `#` JSON header ahead of the data
//! - [`ColumnReader`] - Per-parameter CSV and binary decoding
//! - [`RowReader`] - Iterates records, recognizing JSON status replies
//! - [`HapiSource`] / [`HapiTable`] - A chunked request presented as a table

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hapi-stream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod column;
mod csv;
mod header;
mod rows;
mod table;

pub use column::{ColumnInfo, ColumnReader, Value};
pub use csv::CsvDecoder;
pub use header::{StreamHeader, parse_header};
pub use rows::RowReader;
pub use table::{DataReader, HapiSource, HapiTable};
