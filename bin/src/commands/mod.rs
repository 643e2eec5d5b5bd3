//! CLI command implementations.

pub(crate) mod catalog;
pub(crate) mod data;
pub(crate) mod info;
