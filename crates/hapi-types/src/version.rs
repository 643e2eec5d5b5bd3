//! Protocol versions, endpoints and data stream formats.

use std::str::FromStr;

use crate::HapiError;

/// HAPI protocol version.
///
/// The version decides the request parameter names: 2.x servers use
/// `id`/`time.min`/`time.max`, 3.x servers use `dataset`/`start`/`stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HapiVersion {
    /// Major version number.
    pub major: u32,
    /// Minor version number.
    pub minor: u32,
}

impl HapiVersion {
    /// Version assumed when a server does not say.
    pub const ASSUMED: Self = Self::new(3, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns true if this version uses the 2.x parameter names.
    #[must_use]
    pub const fn is_v2(&self) -> bool {
        self.major < 3
    }

    /// Dataset identifier parameter name.
    #[must_use]
    pub const fn dataset_param(&self) -> &'static str {
        if self.is_v2() { "id" } else { "dataset" }
    }

    /// Interval start parameter name.
    #[must_use]
    pub const fn start_param(&self) -> &'static str {
        if self.is_v2() { "time.min" } else { "start" }
    }

    /// Interval stop parameter name.
    #[must_use]
    pub const fn stop_param(&self) -> &'static str {
        if self.is_v2() { "time.max" } else { "stop" }
    }

    /// Works out the naming convention from the keys of a request.
    ///
    /// Returns `None` if neither the 3.x nor the 2.x start/stop pair is
    /// present.
    pub fn from_param_names<'a>(names: impl IntoIterator<Item = &'a str> + Clone) -> Option<Self> {
        let has = |key: &str| names.clone().into_iter().any(|n| n == key);
        let v3 = Self::new(3, 0);
        let v2 = Self::new(2, 0);
        if has(v3.start_param()) && has(v3.stop_param()) {
            Some(v3)
        } else if has(v2.start_param()) && has(v2.stop_param()) {
            Some(v2)
        } else {
            None
        }
    }
}

impl Default for HapiVersion {
    fn default() -> Self {
        Self::ASSUMED
    }
}

impl std::fmt::Display for HapiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for HapiVersion {
    type Err = HapiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || HapiError::Format(format!("bad HAPI version {s:?}"));
        let mut parts = s.trim().split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| bad())?,
            None => 0,
        };
        Ok(Self::new(major, minor))
    }
}

/// Service endpoint path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapiEndpoint {
    /// Server capabilities document.
    Capabilities,
    /// Dataset catalog.
    Catalog,
    /// Dataset metadata.
    Info,
    /// Dataset data stream.
    Data,
    /// Server description (3.x).
    About,
}

impl HapiEndpoint {
    /// Returns the path segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::Catalog => "catalog",
            Self::Info => "info",
            Self::Data => "data",
            Self::About => "about",
        }
    }

    /// Returns all endpoints.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Capabilities,
            Self::Catalog,
            Self::Info,
            Self::Data,
            Self::About,
        ]
    }

    /// Looks up an endpoint by path segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::all().iter().copied().find(|e| e.as_str() == segment)
    }
}

impl std::fmt::Display for HapiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data payload format, as named by the `format` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamFormat {
    /// RFC-4180-like text.
    #[default]
    Csv,
    /// Fixed-width little-endian records.
    Binary,
    /// JSON arrays (declared by the protocol, not decoded here).
    Json,
}

impl StreamFormat {
    /// Request parameter carrying the format.
    pub const PARAM: &'static str = "format";

    /// Returns the protocol name of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StreamFormat {
    type Err = HapiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "binary" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            _ => Err(HapiError::Format(format!("unknown stream format {s:?}"))),
        }
    }
}
