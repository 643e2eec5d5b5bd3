//! Typed column readers.
//!
//! A [`ColumnReader`] turns the raw fields of one parameter into a
//! [`Value`]. In CSV a parameter occupies one text field per element; in
//! binary it occupies a fixed number of bytes per element, little-endian.

use byteorder::{ByteOrder, LittleEndian};
use hapi_types::{HapiParam, HapiType};

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing or fill string.
    Null,
    /// Text or timestamp.
    Str(String),
    /// 32-bit integer. Integers have no null, so fill reads as zero.
    Int(i32),
    /// Double, with fill and unparseable input read as NaN.
    Double(f64),
    /// String array, fill elements as `None`.
    StrArray(Vec<Option<String>>),
    /// Integer array.
    IntArray(Vec<i32>),
    /// Double array.
    DoubleArray(Vec<f64>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text of a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a scalar numeric value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::StrArray(items) => {
                let parts: Vec<&str> = items.iter().map(|s| s.as_deref().unwrap_or("")).collect();
                write!(f, "{}", parts.join(" "))
            }
            Self::IntArray(items) => write_joined(f, items),
            Self::DoubleArray(items) => write_joined(f, items),
        }
    }
}

fn write_joined<T: std::fmt::Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Column metadata exposed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Parameter name.
    pub name: String,
    /// Element type.
    pub kind: HapiType,
    /// Array shape, first index fastest.
    pub shape: Option<Vec<usize>>,
    /// Units text.
    pub units: Option<String>,
    /// Display label.
    pub label: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// True for the time column.
    pub is_time: bool,
}

impl From<&HapiParam> for ColumnInfo {
    fn from(param: &HapiParam) -> Self {
        Self {
            name: param.name.clone(),
            kind: param.kind,
            shape: param.array_shape(),
            units: param.units_text(),
            label: param.label.as_ref().map(|l| l.joined()),
            description: param.description.clone(),
            is_time: param.is_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Fill {
    None,
    Text(String),
    Int(i32),
    Double(f64),
}

impl Fill {
    fn for_param(param: &HapiParam) -> Self {
        let Some(text) = param.fill.as_deref() else {
            return Self::None;
        };
        match param.kind {
            HapiType::String | HapiType::IsoTime => Self::Text(text.to_string()),
            HapiType::Integer => text.trim().parse().map_or(Self::None, Self::Int),
            HapiType::Double => match text.trim().parse::<f64>() {
                Ok(v) if !v.is_nan() => Self::Double(v),
                _ => Self::None,
            },
        }
    }
}

/// Decodes the fields of one parameter.
#[derive(Debug, Clone)]
pub struct ColumnReader {
    info: ColumnInfo,
    kind: HapiType,
    elements: usize,
    array: bool,
    element_bytes: Option<usize>,
    fill: Fill,
}

impl ColumnReader {
    /// Creates a reader for `param`.
    #[must_use]
    pub fn new(param: &HapiParam) -> Self {
        Self {
            info: ColumnInfo::from(param),
            kind: param.kind,
            elements: param.element_count(),
            array: param.is_array(),
            element_bytes: param.kind.fixed_width().or(param.length),
            fill: Fill::for_param(param),
        }
    }

    /// Column metadata.
    #[must_use]
    pub const fn info(&self) -> &ColumnInfo {
        &self.info
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Number of output columns this reader fills.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        1
    }

    /// Number of CSV fields consumed per row.
    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.elements
    }

    /// Number of binary bytes consumed per row.
    ///
    /// `None` for a string parameter declared without a length.
    #[must_use]
    pub fn byte_count(&self) -> Option<usize> {
        self.element_bytes.map(|w| w * self.elements)
    }

    /// Decodes this parameter from its CSV fields.
    ///
    /// Missing trailing fields are read as empty text.
    #[must_use]
    pub fn read_fields(&self, fields: &[String]) -> Value {
        let text = (0..self.elements).map(|i| fields.get(i).map_or("", String::as_str));
        match self.kind {
            HapiType::String | HapiType::IsoTime => {
                self.strings(text.map(|s| self.fill_text(s)).collect())
            }
            HapiType::Integer => {
                self.ints(text.map(|s| self.fill_int(s.trim().parse().unwrap_or(0))).collect())
            }
            HapiType::Double => self.doubles(
                text.map(|s| self.fill_double(s.trim().parse().unwrap_or(f64::NAN)))
                    .collect(),
            ),
        }
    }

    /// Decodes this parameter from its binary bytes.
    ///
    /// `bytes` must hold exactly [`Self::byte_count`] bytes.
    #[must_use]
    pub fn read_bytes(&self, bytes: &[u8]) -> Value {
        let width = self.element_bytes.unwrap_or(0).max(1);
        let elements = bytes.chunks_exact(width).take(self.elements);
        match self.kind {
            HapiType::String | HapiType::IsoTime => self.strings(
                elements
                    .map(|raw| {
                        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                        self.fill_text(&String::from_utf8_lossy(&raw[..end]))
                    })
                    .collect(),
            ),
            HapiType::Integer => self.ints(
                elements
                    .map(|raw| self.fill_int(LittleEndian::read_i32(raw)))
                    .collect(),
            ),
            HapiType::Double => self.doubles(
                elements
                    .map(|raw| self.fill_double(LittleEndian::read_f64(raw)))
                    .collect(),
            ),
        }
    }

    fn strings(&self, mut items: Vec<Option<String>>) -> Value {
        if self.array {
            Value::StrArray(items)
        } else {
            items.pop().flatten().map_or(Value::Null, Value::Str)
        }
    }

    fn ints(&self, mut items: Vec<i32>) -> Value {
        if self.array {
            Value::IntArray(items)
        } else {
            Value::Int(items.pop().unwrap_or(0))
        }
    }

    fn doubles(&self, mut items: Vec<f64>) -> Value {
        if self.array {
            Value::DoubleArray(items)
        } else {
            Value::Double(items.pop().unwrap_or(f64::NAN))
        }
    }

    fn fill_text(&self, text: &str) -> Option<String> {
        match &self.fill {
            Fill::Text(fill) if fill == text => None,
            _ => Some(text.to_string()),
        }
    }

    fn fill_int(&self, value: i32) -> i32 {
        match self.fill {
            Fill::Int(fill) if fill == value => 0,
            _ => value,
        }
    }

    #[allow(clippy::float_cmp)]
    fn fill_double(&self, value: f64) -> f64 {
        match self.fill {
            Fill::Double(fill) if fill == value => f64::NAN,
            _ => value,
        }
    }
}
