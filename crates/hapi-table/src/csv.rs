//! Byte-level CSV row decoding.
//!
//! HAPI CSV follows RFC 4180: fields may be wrapped in double quotes, a
//! doubled quote inside a quoted field stands for one quote, and quoted
//! fields may contain commas and line breaks. Either `\r` or `\n` ends a
//! row, and blank lines are skipped rather than returned as empty rows.
//!
//! Malformed input is tolerated. End of input inside a quoted field ends
//! the field and the row; text between a closing quote and the next
//! delimiter is dropped. Each kind of problem is logged once per decoder.

use futures::io::{AsyncBufRead, AsyncBufReadExt};
use std::io;
use tracing::warn;

/// Decoder state while reading one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of a field.
    Init,
    /// Inside a field that did not start with a quote.
    ReadingUnquoted,
    /// Inside a quoted field.
    ReadingQuoted,
    /// Just read a quote inside a quoted field.
    QuoteInQuoted,
    /// After a closing quote, skipping to the next delimiter.
    EndQuoted,
    /// Row complete.
    EndLine,
    /// Input exhausted with no row.
    EndFile,
}

impl State {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::EndLine | Self::EndFile)
    }
}

const EOF_IN_QUOTES: &str = "CSV input ended inside a quoted field";
const TRAILING_CONTENT: &str = "Ignoring CSV content after closing quote of field";

/// Reads rows of text fields from a byte stream.
#[derive(Debug, Default)]
pub struct CsvDecoder {
    prefix: Option<u8>,
    warnings: Vec<String>,
}

impl CsvDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies a byte to be read before the stream's next byte.
    ///
    /// Used when the caller has already consumed the first byte of the data,
    /// for instance to check what kind of content follows.
    pub const fn set_prefix(&mut self, byte: u8) {
        self.prefix = Some(byte);
    }

    /// Distinct warnings issued so far, in order of first occurrence.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Reads the next row.
    ///
    /// Returns `Ok(None)` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns any error of the underlying reader.
    pub async fn read_row<R>(&mut self, reader: &mut R) -> io::Result<Option<Vec<String>>>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut fields = Vec::new();
        let mut field = Vec::new();
        let mut state = State::Init;

        while !state.is_terminal() {
            let c = match self.prefix.take() {
                Some(b) => Some(b),
                None => read_byte(reader).await?,
            };
            state = match (state, c) {
                (State::Init, None) => {
                    if fields.is_empty() {
                        State::EndFile
                    } else {
                        end_field(&mut fields, &mut field);
                        State::EndLine
                    }
                }
                (State::Init, Some(b'\r' | b'\n')) => {
                    if fields.is_empty() {
                        // Blank separator, not an empty row.
                        State::Init
                    } else {
                        end_field(&mut fields, &mut field);
                        State::EndLine
                    }
                }
                (State::Init, Some(b',')) => {
                    end_field(&mut fields, &mut field);
                    State::Init
                }
                (State::Init, Some(b'"')) => State::ReadingQuoted,
                (State::Init, Some(b)) => {
                    field.push(b);
                    State::ReadingUnquoted
                }

                (State::ReadingUnquoted, None | Some(b'\r' | b'\n')) => {
                    end_field(&mut fields, &mut field);
                    State::EndLine
                }
                (State::ReadingUnquoted, Some(b',')) => {
                    end_field(&mut fields, &mut field);
                    State::Init
                }
                (State::ReadingUnquoted, Some(b'"')) if field.iter().all(|&b| is_blank(b)) => {
                    field.clear();
                    State::ReadingQuoted
                }
                (State::ReadingUnquoted, Some(b)) => {
                    field.push(b);
                    State::ReadingUnquoted
                }

                (State::ReadingQuoted, None) => {
                    self.warn_once(EOF_IN_QUOTES);
                    end_field(&mut fields, &mut field);
                    State::EndLine
                }
                (State::ReadingQuoted, Some(b'"')) => State::QuoteInQuoted,
                (State::ReadingQuoted, Some(b)) => {
                    field.push(b);
                    State::ReadingQuoted
                }

                (State::QuoteInQuoted, Some(b'"')) => {
                    field.push(b'"');
                    State::ReadingQuoted
                }
                (State::QuoteInQuoted | State::EndQuoted, Some(b',')) => {
                    end_field(&mut fields, &mut field);
                    State::Init
                }
                (State::QuoteInQuoted | State::EndQuoted, None | Some(b'\r' | b'\n')) => {
                    end_field(&mut fields, &mut field);
                    State::EndLine
                }
                (State::QuoteInQuoted, Some(_)) => {
                    self.warn_once(TRAILING_CONTENT);
                    State::EndQuoted
                }
                (State::EndQuoted, Some(_)) => State::EndQuoted,

                (terminal @ (State::EndLine | State::EndFile), _) => terminal,
            };
        }

        Ok(match state {
            State::EndFile => None,
            _ => Some(fields),
        })
    }

    fn warn_once(&mut self, message: &str) {
        if !self.warnings.iter().any(|w| w == message) {
            warn!("{}", message);
            self.warnings.push(message.to_string());
        }
    }
}

const fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

fn end_field(fields: &mut Vec<String>, field: &mut Vec<u8>) {
    fields.push(String::from_utf8_lossy(field).into_owned());
    field.clear();
}

/// Reads a single byte, returning `None` at end of input.
pub(crate) async fn read_byte<R>(reader: &mut R) -> io::Result<Option<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let buf = reader.fill_buf().await?;
    let Some(&b) = buf.first() else {
        return Ok(None);
    };
    reader.consume_unpin(1);
    Ok(Some(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    async fn decode(input: &[u8]) -> (Vec<Vec<String>>, Vec<String>) {
        let mut decoder = CsvDecoder::new();
        let mut reader = Cursor::new(input.to_vec());
        let mut rows = Vec::new();
        while let Some(row) = decoder.read_row(&mut reader).await.unwrap() {
            rows.push(row);
        }
        (rows, decoder.warnings().to_vec())
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(ToString::to_string).collect()
    }

    /// Quotes every field, doubling embedded quotes.
    fn encode(fields: &[&str]) -> String {
        let quoted: Vec<String> = fields
            .iter()
            .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
            .collect();
        quoted.join(",") + "\r\n"
    }

    #[tokio::test]
    async fn test_simple_rows() {
        let (rows, warnings) = decode(b"2020-01-01T00:00Z,1.5,7\n2020-01-01T00:01Z,2.5,8\n").await;
        assert_eq!(
            rows,
            vec![
                row(&["2020-01-01T00:00Z", "1.5", "7"]),
                row(&["2020-01-01T00:01Z", "2.5", "8"]),
            ]
        );
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_line_endings_and_blank_lines() {
        let (rows, _) = decode(b"\r\n\na,b\r\nc,d\r\r\n\ne,f").await;
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d"]), row(&["e", "f"])]);
    }

    #[tokio::test]
    async fn test_empty_fields() {
        let (rows, _) = decode(b",,\nx,\n").await;
        assert_eq!(rows, vec![row(&["", "", ""]), row(&["x", ""])]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (rows, warnings) = decode(b"").await;
        assert!(rows.is_empty());
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_quoted_fields() {
        let (rows, warnings) =
            decode(b"\"x,y\",\"he said \"\"hi\"\"\",\"line1\nline2\",plain\n").await;
        assert_eq!(
            rows,
            vec![row(&["x,y", "he said \"hi\"", "line1\nline2", "plain"])]
        );
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_quote_after_leading_whitespace() {
        let (rows, _) = decode(b"  \"a,b\",c\n").await;
        assert_eq!(rows, vec![row(&["a,b", "c"])]);
    }

    #[tokio::test]
    async fn test_quote_mid_field_is_literal() {
        let (rows, _) = decode(b"ab\"c,d\n").await;
        assert_eq!(rows, vec![row(&["ab\"c", "d"])]);
    }

    #[tokio::test]
    async fn test_trailing_content_after_quote() {
        let (rows, warnings) = decode(b"\"abc\" xyz\n").await;
        assert_eq!(rows, vec![row(&["abc"])]);
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_trailing_content_warned_once() {
        let (rows, warnings) = decode(b"\"a\"junk,\"b\" x\n\"c\"  ,d\n").await;
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d"])]);
        assert_eq!(warnings, vec![TRAILING_CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_eof_inside_quotes() {
        let (rows, warnings) = decode(b"a,\"unterminated").await;
        assert_eq!(rows, vec![row(&["a", "unterminated"])]);
        assert_eq!(warnings, vec![EOF_IN_QUOTES.to_string()]);
    }

    #[tokio::test]
    async fn test_prefix_byte() {
        let mut decoder = CsvDecoder::new();
        decoder.set_prefix(b'2');
        let mut reader = Cursor::new(b"020-01-01,1\n2020-01-02,2\n".to_vec());
        let first = decoder.read_row(&mut reader).await.unwrap();
        assert_eq!(first, Some(row(&["2020-01-01", "1"])));
        let second = decoder.read_row(&mut reader).await.unwrap();
        assert_eq!(second, Some(row(&["2020-01-02", "2"])));
        assert_eq!(decoder.read_row(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_utf8_fields() {
        let (rows, _) = decode("München,\"Zürich, CH\"\n".as_bytes()).await;
        assert_eq!(rows, vec![row(&["München", "Zürich, CH"])]);
    }

    #[tokio::test]
    async fn test_quoted_encoding_decodes_to_original() {
        let originals: Vec<Vec<&str>> = vec![
            vec!["plain", "", "with,comma"],
            vec!["\"", "\"\"", "say \"cheese\""],
            vec!["multi\nline", "cr\rlf\r\n", " padded "],
            vec!["", ""],
        ];
        let text: String = originals.iter().map(|r| encode(r)).collect();
        let (rows, warnings) = decode(text.as_bytes()).await;
        let expected: Vec<Vec<String>> = originals.iter().map(|r| row(r)).collect();
        assert_eq!(rows, expected);
        assert!(warnings.is_empty());
    }
}
