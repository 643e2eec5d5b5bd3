//! Row iteration over a CSV or binary data stream.

use futures::io::{AsyncBufRead, AsyncReadExt};
use futures::stream::{self, Stream};
use hapi_types::{HapiError, StreamFormat};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::column::{ColumnReader, Value};
use crate::csv::{CsvDecoder, read_byte};

/// Iterates the records of a data stream.
///
/// The reader is positioned past any header. A stream whose first byte is
/// `{` carries a JSON status document instead of data; it is logged and
/// read as an empty result.
pub struct RowReader<R> {
    reader: R,
    format: StreamFormat,
    columns: Vec<ColumnReader>,
    widths: Vec<usize>,
    csv: CsvDecoder,
    record: Vec<u8>,
    prefix: Option<u8>,
    row: Vec<Value>,
    rows_read: usize,
    done: bool,
}

impl<R> RowReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Opens a row reader whose first byte has already been consumed.
    ///
    /// `first` is that byte, or `None` if the stream was already exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`HapiError::Unsupported`] for JSON streams,
    /// [`HapiError::Format`] for a binary stream whose record width is
    /// unknown or for an unexpected leading `{`.
    pub async fn open(
        mut reader: R,
        format: StreamFormat,
        columns: Vec<ColumnReader>,
        first: Option<u8>,
    ) -> Result<Self, HapiError> {
        let widths = match format {
            StreamFormat::Json => {
                return Err(HapiError::Unsupported(
                    "JSON data streams are not decoded; request csv or binary".to_string(),
                ));
            }
            StreamFormat::Csv => Vec::new(),
            StreamFormat::Binary => binary_widths(&columns)?,
        };

        let mut csv = CsvDecoder::new();
        let mut prefix = None;
        let mut done = first.is_none();
        match first {
            Some(b'{') => {
                read_status(&mut reader, format).await?;
                done = true;
            }
            Some(b) if format == StreamFormat::Csv => csv.set_prefix(b),
            Some(b) => prefix = Some(b),
            None => debug!("HAPI {} data stream is empty", format),
        }

        let record_len = widths.iter().sum();
        let row = vec![Value::Null; columns.len()];
        Ok(Self {
            reader,
            format,
            columns,
            widths,
            csv,
            record: vec![0; record_len],
            prefix,
            row,
            rows_read: 0,
            done,
        })
    }

    /// Opens a row reader at the start of `reader`.
    ///
    /// # Errors
    ///
    /// See [`Self::open`].
    pub async fn from_reader(
        mut reader: R,
        format: StreamFormat,
        columns: Vec<ColumnReader>,
    ) -> Result<Self, HapiError> {
        let first = read_byte(&mut reader).await?;
        Self::open(reader, format, columns, first).await
    }

    /// Column readers, in row order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnReader] {
        &self.columns
    }

    /// The current row, valid after [`Self::next`] returned true.
    #[must_use]
    pub fn row(&self) -> &[Value] {
        &self.row
    }

    /// Number of rows read so far.
    #[must_use]
    pub const fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Warnings raised while decoding CSV.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        self.csv.warnings()
    }

    /// Advances to the next row, returning false at end of data.
    ///
    /// # Errors
    ///
    /// Returns any error carried by the stream, and
    /// [`HapiError::TruncatedRecord`] if a binary stream ends mid-record.
    pub async fn next(&mut self) -> Result<bool, HapiError> {
        if self.done {
            return Ok(false);
        }
        let more = match self.format {
            StreamFormat::Csv => self.next_csv().await?,
            StreamFormat::Binary => self.next_binary().await?,
            StreamFormat::Json => false,
        };
        if more {
            self.rows_read += 1;
        } else {
            self.done = true;
        }
        Ok(more)
    }

    /// Releases the underlying stream.
    pub fn close(self) {
        debug!("closing HAPI row reader after {} rows", self.rows_read);
    }

    /// Converts the reader into a stream of owned rows.
    pub fn into_rows(self) -> impl Stream<Item = Result<Vec<Value>, HapiError>> {
        stream::try_unfold(self, |mut rows| async move {
            if rows.next().await? {
                let row = rows.row().to_vec();
                Ok::<_, HapiError>(Some((row, rows)))
            } else {
                Ok(None)
            }
        })
    }

    async fn next_csv(&mut self) -> Result<bool, HapiError> {
        let Some(fields) = self.csv.read_row(&mut self.reader).await? else {
            return Ok(false);
        };
        let mut offset = 0;
        for (slot, column) in self.row.iter_mut().zip(&self.columns) {
            let end = (offset + column.field_count()).min(fields.len());
            let slice = fields.get(offset..end).unwrap_or(&[]);
            *slot = column.read_fields(slice);
            offset += column.field_count();
        }
        Ok(true)
    }

    async fn next_binary(&mut self) -> Result<bool, HapiError> {
        let expected = self.record.len();
        let mut filled = 0;
        if let Some(b) = self.prefix.take() {
            self.record[0] = b;
            filled = 1;
        }
        while filled < expected {
            let n = self.reader.read(&mut self.record[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(HapiError::TruncatedRecord {
                    expected,
                    actual: filled,
                });
            }
            filled += n;
        }

        let mut offset = 0;
        for ((slot, column), width) in self.row.iter_mut().zip(&self.columns).zip(&self.widths) {
            *slot = column.read_bytes(&self.record[offset..offset + width]);
            offset += width;
        }
        Ok(true)
    }
}

impl<R> std::fmt::Debug for RowReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("format", &self.format)
            .field("columns", &self.columns.len())
            .field("rows_read", &self.rows_read)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

fn binary_widths(columns: &[ColumnReader]) -> Result<Vec<usize>, HapiError> {
    if columns.is_empty() {
        return Err(HapiError::Format(
            "binary stream needs at least one parameter".to_string(),
        ));
    }
    let widths = columns
        .iter()
        .map(|c| {
            c.byte_count().ok_or_else(|| {
                HapiError::Format(format!(
                    "binary stream needs a length for string parameter {}",
                    c.name()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if widths.iter().sum::<usize>() == 0 {
        return Err(HapiError::Format(
            "binary record width is zero".to_string(),
        ));
    }
    Ok(widths)
}

/// Reads the rest of a stream that began with `{` as a status document.
async fn read_status<R>(reader: &mut R, format: StreamFormat) -> Result<(), HapiError>
where
    R: AsyncBufRead + Unpin,
{
    let mut bytes = vec![b'{'];
    reader.read_to_end(&mut bytes).await?;
    let status = serde_json::from_slice::<JsonValue>(&bytes)
        .ok()
        .and_then(|json| json.get("status").cloned());
    match status {
        Some(JsonValue::Object(status)) => {
            info!(
                "HAPI returned status {} {} instead of data",
                status.get("code").map_or_else(String::new, ToString::to_string),
                status
                    .get("message")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
            );
            Ok(())
        }
        _ => Err(HapiError::Format(format!(
            "unexpected leading byte '{{' (0x7b) in {format} data stream"
        ))),
    }
}
