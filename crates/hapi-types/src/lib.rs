//! Core protocol types for the hapi-stream HAPI client.
//!
//! This crate provides the vocabulary shared by the other hapi-stream crates:
//!
//! - [`HapiError`] / [`ServiceError`] - Error taxonomy
//! - [`parse_iso`] / [`iso_midpoint`] - ISO-8601 request bound handling
//! - [`RequestInterval`] - Immutable `[start, stop)` request interval
//! - [`HapiVersion`] - Protocol version and parameter naming
//! - [`HapiParam`] - Dataset column descriptor
//! - [`HapiInfo`] / [`HapiCatalog`] / [`HapiCapabilities`] - Metadata documents

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hapi-stream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod info;
mod interval;
mod param;
mod time;
mod version;

pub use error::{HapiError, Result, ServiceError, find_status_code};
pub use info::{CatalogEntry, HapiCapabilities, HapiCatalog, HapiInfo, HapiStatus};
pub use interval::{RequestInterval, TimeBound};
pub use param::{HapiParam, HapiType, OneOrMany};
pub use time::{iso_midpoint, iso_to_seconds, parse_iso, seconds_to_iso};
pub use version::{HapiEndpoint, HapiVersion, StreamFormat};
