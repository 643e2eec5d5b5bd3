//! Dataset parameter (column) descriptors.

use serde::{Deserialize, Serialize};

/// Scalar type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapiType {
    /// UTF-8 text, NUL padded to `length` bytes in binary streams.
    String,
    /// ISO-8601 timestamp, encoded exactly as a string.
    #[serde(rename = "isotime")]
    IsoTime,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit IEEE-754 float.
    Double,
}

impl HapiType {
    /// Returns the protocol name of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::IsoTime => "isotime",
            Self::Integer => "integer",
            Self::Double => "double",
        }
    }

    /// Fixed binary width of one element, if the type has one.
    ///
    /// String-like types take their width from the parameter `length`.
    #[must_use]
    pub const fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::String | Self::IsoTime => None,
            Self::Integer => Some(4),
            Self::Double => Some(8),
        }
    }
}

impl std::fmt::Display for HapiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A metadata item that may be given once or once per array element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// One value for the whole parameter.
    One(String),
    /// One value per element.
    Many(Vec<Option<String>>),
}

impl OneOrMany {
    /// Returns a single representative string, joining per-element values.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Many(items) => items
                .iter()
                .map(|s| s.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Describes one dataset parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapiParam {
    /// Parameter name.
    pub name: String,
    /// Scalar element type.
    #[serde(rename = "type")]
    pub kind: HapiType,
    /// Byte width of string-like elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// Fill value, as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Array dimensions, last index varying fastest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<usize>>,
    /// Units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<OneOrMany>,
    /// Short display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<OneOrMany>,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HapiParam {
    /// Creates a scalar parameter with no optional metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: HapiType) -> Self {
        Self {
            name: name.into(),
            kind,
            length: None,
            fill: None,
            size: None,
            units: None,
            label: None,
            description: None,
        }
    }

    /// Sets the string length.
    #[must_use]
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the fill value.
    #[must_use]
    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    /// Sets the array size.
    #[must_use]
    pub fn with_size(mut self, size: Vec<usize>) -> Self {
        self.size = Some(size);
        self
    }

    /// Number of scalar elements per record.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.size.as_ref().map_or(1, |dims| dims.iter().product())
    }

    /// Returns true if the parameter is array-valued.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.size.is_some()
    }

    /// Returns the array shape in first-index-fastest order.
    ///
    /// The protocol gives `size` with the last index varying fastest, so the
    /// dimensions are reversed: a declared `[2, 3]` becomes `[3, 2]`.
    #[must_use]
    pub fn array_shape(&self) -> Option<Vec<usize>> {
        self.size
            .as_ref()
            .map(|dims| dims.iter().rev().copied().collect())
    }

    /// Returns the units as one string.
    #[must_use]
    pub fn units_text(&self) -> Option<String> {
        self.units.as_ref().map(OneOrMany::joined)
    }

    /// Returns true if this is the time column type.
    #[must_use]
    pub const fn is_time(&self) -> bool {
        matches!(self.kind, HapiType::IsoTime)
    }
}

impl std::fmt::Display for HapiParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)?;
        if let Some(size) = &self.size {
            write!(f, "{size:?}")?;
        }
        Ok(())
    }
}
