//! JSON documents served by the metadata endpoints.

use serde::{Deserialize, Serialize};

use crate::{HapiParam, HapiVersion};

/// The `status` object carried by every HAPI response document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapiStatus {
    /// Protocol status code (1200 is OK).
    pub code: u16,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl HapiStatus {
    /// Code for a successful request.
    pub const OK: u16 = 1200;

    /// Returns true if the status reports success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 1200 && self.code < 1300
    }
}

/// Reads the `HAPI` version string of a document, falling back to
/// [`HapiVersion::ASSUMED`].
fn version_of(text: Option<&str>) -> HapiVersion {
    text.and_then(|v| v.parse().ok()).unwrap_or_default()
}

/// Dataset metadata returned by the `info` endpoint (and embedded in
/// data stream headers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapiInfo {
    /// Protocol version string.
    #[serde(rename = "HAPI", default)]
    pub hapi: Option<String>,
    /// Response status.
    #[serde(default)]
    pub status: Option<HapiStatus>,
    /// Dataset columns, time column first.
    pub parameters: Vec<HapiParam>,
    /// Earliest available data.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Latest available data.
    #[serde(default)]
    pub stop_date: Option<String>,
    /// Suggested start of a small sample request.
    #[serde(default)]
    pub sample_start_date: Option<String>,
    /// Suggested stop of a small sample request.
    #[serde(default)]
    pub sample_stop_date: Option<String>,
    /// Nominal time between records, as an ISO-8601 duration.
    #[serde(default)]
    pub cadence: Option<String>,
    /// Largest interval the server will serve in one request.
    #[serde(default)]
    pub max_request_duration: Option<String>,
    /// Format of the data stream this header came from.
    #[serde(default)]
    pub format: Option<String>,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to further documentation.
    #[serde(default, rename = "resourceURL")]
    pub resource_url: Option<String>,
}

impl HapiInfo {
    /// Parses an info document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not describe a dataset.
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }

    /// Returns the protocol version of the document.
    #[must_use]
    pub fn version(&self) -> HapiVersion {
        version_of(self.hapi.as_deref())
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&HapiParam> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// One entry of the dataset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Dataset identifier.
    pub id: String,
    /// Optional human-readable title.
    #[serde(default)]
    pub title: Option<String>,
}

/// The `catalog` endpoint document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapiCatalog {
    /// Protocol version string.
    #[serde(rename = "HAPI", default)]
    pub hapi: Option<String>,
    /// Response status.
    #[serde(default)]
    pub status: Option<HapiStatus>,
    /// Available datasets.
    pub catalog: Vec<CatalogEntry>,
}

impl HapiCatalog {
    /// Returns the protocol version the server speaks.
    #[must_use]
    pub fn version(&self) -> HapiVersion {
        version_of(self.hapi.as_deref())
    }

    /// Returns the dataset identifiers.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.catalog.iter().map(|e| e.id.as_str())
    }
}

/// The `capabilities` endpoint document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapiCapabilities {
    /// Protocol version string.
    #[serde(rename = "HAPI", default)]
    pub hapi: Option<String>,
    /// Response status.
    #[serde(default)]
    pub status: Option<HapiStatus>,
    /// Data stream formats the server can produce.
    #[serde(default)]
    pub output_formats: Vec<String>,
}

impl HapiCapabilities {
    /// Returns true if the server can produce binary streams.
    #[must_use]
    pub fn supports_binary(&self) -> bool {
        self.output_formats.iter().any(|f| f == "binary")
    }
}
