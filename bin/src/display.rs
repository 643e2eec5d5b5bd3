//! Display utilities and output formatting for the hapi CLI.

use clap::ValueEnum;
use hapi_lib::prelude::*;
use hapi_lib::ColumnInfo;

/// Wire format requested from the server.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum DataFormat {
    Csv,
    Binary,
}

impl From<DataFormat> for StreamFormat {
    fn from(format: DataFormat) -> Self {
        match format {
            DataFormat::Csv => Self::Csv,
            DataFormat::Binary => Self::Binary,
        }
    }
}

/// Quotes a CSV field if it contains a delimiter, quote or line break.
pub(crate) fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Header names, one per output field; array columns get an index suffix.
pub(crate) fn header_fields(columns: &[ColumnInfo]) -> Vec<String> {
    let mut names = Vec::new();
    for column in columns {
        let count: usize = column.shape.as_ref().map_or(1, |s| s.iter().product());
        if column.shape.is_some() {
            names.extend((0..count).map(|i| format!("{}[{i}]", column.name)));
        } else {
            names.push(column.name.clone());
        }
    }
    names
}

/// Formats one row as a CSV line, expanding arrays to one field per element.
pub(crate) fn csv_line(row: &[Value]) -> String {
    let mut fields: Vec<String> = Vec::new();
    for value in row {
        match value {
            Value::StrArray(items) => {
                fields.extend(items.iter().map(|s| csv_field(s.as_deref().unwrap_or(""))));
            }
            Value::IntArray(items) => fields.extend(items.iter().map(ToString::to_string)),
            Value::DoubleArray(items) => fields.extend(items.iter().map(ToString::to_string)),
            scalar => fields.push(csv_field(&scalar.to_string())),
        }
    }
    fields.join(",")
}
