//! Comment header that may precede a data stream.

use futures::io::AsyncBufRead;
use hapi_types::{HapiError, HapiInfo};
use serde_json::{Map, Value};

use crate::csv::read_byte;

/// The `#`-prefixed JSON header of a data stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamHeader {
    /// Header document, if the stream had one.
    pub json: Option<Map<String, Value>>,
    /// First byte after the header, already consumed from the reader.
    pub overread: Option<u8>,
}

impl StreamHeader {
    /// Interprets the header as dataset metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the header does not describe a dataset.
    pub fn info(&self) -> Result<Option<HapiInfo>, HapiError> {
        self.json
            .as_ref()
            .map(|json| HapiInfo::from_json(Value::Object(json.clone())))
            .transpose()
            .map_err(HapiError::from)
    }
}

/// Reads the leading run of `#` lines from `reader`.
///
/// The text after each `#` is joined into one JSON document; lines that are
/// blank after the marker are dropped. Reading stops at the first byte of a
/// line that does not start with `#`, which is handed back in
/// [`StreamHeader::overread`].
///
/// # Errors
///
/// Returns an error on a read failure or if the header is not a JSON object.
pub async fn parse_header<R>(reader: &mut R) -> Result<StreamHeader, HapiError>
where
    R: AsyncBufRead + Unpin,
{
    let mut text = String::new();
    let mut line = Vec::new();
    let overread = loop {
        match read_byte(reader).await? {
            Some(b'#') => {}
            other => break other,
        }
        line.clear();
        while let Some(b) = read_byte(reader).await? {
            if b == b'\n' {
                break;
            }
            line.push(b);
        }
        let content = String::from_utf8_lossy(&line);
        let content = content.trim_end_matches('\r');
        if !content.trim().is_empty() {
            text.push_str(content);
            text.push('\n');
        }
    };

    let json = if text.trim().is_empty() {
        None
    } else {
        match serde_json::from_str(&text)? {
            Value::Object(map) => Some(map),
            _ => {
                return Err(HapiError::Format(
                    "stream header is not a JSON object".to_string(),
                ));
            }
        }
    };
    Ok(StreamHeader { json, overread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_header_and_overread() {
        let input = b"#{\"HAPI\": \"3.0\",\n#\n#  \"parameters\": [{\"name\": \"Time\", \"type\": \"isotime\", \"length\": 24}]}\r\n2020-01-01T00:00:00.000Z\n";
        let mut reader = Cursor::new(input.to_vec());
        let header = parse_header(&mut reader).await.unwrap();
        assert_eq!(header.overread, Some(b'2'));

        let info = header.info().unwrap().unwrap();
        assert_eq!(info.hapi.as_deref(), Some("3.0"));
        assert_eq!(info.parameters.len(), 1);
        assert_eq!(info.parameters[0].length, Some(24));
    }

    #[tokio::test]
    async fn test_no_header() {
        let mut reader = Cursor::new(b"abc".to_vec());
        let header = parse_header(&mut reader).await.unwrap();
        assert_eq!(header, StreamHeader { json: None, overread: Some(b'a') });
        assert!(header.info().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let mut reader = Cursor::new(Vec::new());
        let header = parse_header(&mut reader).await.unwrap();
        assert_eq!(header, StreamHeader::default());
    }

    #[tokio::test]
    async fn test_header_only() {
        let mut reader = Cursor::new(b"#{\"a\": 1}".to_vec());
        let header = parse_header(&mut reader).await.unwrap();
        assert_eq!(header.overread, None);
        assert_eq!(header.json.unwrap().get("a"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn test_non_object_header() {
        let mut reader = Cursor::new(b"#[1, 2]\n".to_vec());
        assert!(matches!(
            parse_header(&mut reader).await,
            Err(HapiError::Format(_))
        ));
    }
}
