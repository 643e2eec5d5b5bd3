//! Error types for hapi-stream.

use std::io;
use thiserror::Error;

/// Result type alias for hapi-stream operations.
pub type Result<T> = std::result::Result<T, HapiError>;

/// Errors that can occur while requesting and decoding HAPI data.
#[derive(Error, Debug)]
pub enum HapiError {
    /// Transport-level failure (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server returned a non-success status without a protocol error code.
    #[error("HTTP status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or response text.
        message: String,
    },

    /// Server reported a protocol-level error code.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// JSON syntax or shape error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload does not have the expected format.
    #[error("Format error: {0}")]
    Format(String),

    /// Binary stream ended part way through a record.
    #[error("Binary stream ended mid-record ({actual} of {expected} bytes)")]
    TruncatedRecord {
        /// Bytes per record.
        expected: usize,
        /// Bytes actually read before end of stream.
        actual: usize,
    },

    /// Timestamp could not be parsed.
    #[error("Bad ISO-8601 time: {0:?}")]
    Time(String),

    /// A required request parameter is absent.
    #[error("Missing request parameter: {0}")]
    MissingParameter(String),

    /// Redirect chain was longer than allowed.
    #[error("Too many redirects (limit {0})")]
    Redirects(u32),

    /// Operation is not available in this mode.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<io::Error> for HapiError {
    /// Unwraps errors that were carried through a byte stream as
    /// `io::Error::other(HapiError)`, so typed errors survive the reader.
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            return Self::Io(err);
        }
        let kind = err.kind();
        match err.into_inner() {
            Some(inner) => match inner.downcast::<Self>() {
                Ok(hapi) => *hapi,
                Err(other) => Self::Io(io::Error::new(kind, other)),
            },
            None => Self::Io(io::Error::from(kind)),
        }
    }
}

impl From<HapiError> for io::Error {
    fn from(err: HapiError) -> Self {
        match err {
            HapiError::Io(io) => io,
            other => Self::other(other),
        }
    }
}

/// A protocol-level error reported by a HAPI server.
///
/// HAPI servers signal failures with a four digit status code starting with
/// `1`, embedded in the HTTP reason phrase and in the JSON `status` object of
/// the response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HAPI error {code}: {message}")]
pub struct ServiceError {
    code: u16,
    message: String,
}

impl ServiceError {
    /// Code meaning "too much time or data requested".
    pub const TOO_MUCH_DATA: u16 = 1408;

    /// Creates a new service error.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the protocol status code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the server refused the request as too large.
    #[must_use]
    pub const fn is_too_much_data(&self) -> bool {
        self.code == Self::TOO_MUCH_DATA
    }
}

impl HapiError {
    /// Returns true if this is a "too much data" service error.
    #[must_use]
    pub const fn is_too_much_data(&self) -> bool {
        matches!(self, Self::Service(e) if e.is_too_much_data())
    }
}

/// Finds a protocol error code in free text.
///
/// Matches a four digit number starting with `1` that is not part of a
/// longer digit run, e.g. `"HAPI 1408 Bad request - too much time"`.
#[must_use]
pub fn find_status_code(text: &str) -> Option<u16> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let digits = &text[start..i];
        if digits.len() == 4 && digits.starts_with('1') {
            return digits.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_status_code() {
        assert_eq!(
            find_status_code("HAPI 1408 Bad request - too much time or data requested"),
            Some(1408)
        );
        assert_eq!(find_status_code("HAPI error 1406: unknown dataset"), Some(1406));
        assert_eq!(find_status_code("1500"), Some(1500));
        assert_eq!(find_status_code("Bad Request"), None);
        assert_eq!(find_status_code("code 14080"), None);
        assert_eq!(find_status_code("code 2408"), None);
        assert_eq!(find_status_code("status 400 then 1201."), Some(1201));
    }

    #[test]
    fn test_too_much_data() {
        let err = HapiError::from(ServiceError::new(1408, "too much"));
        assert!(err.is_too_much_data());
        let err = HapiError::from(ServiceError::new(1406, "unknown dataset"));
        assert!(!err.is_too_much_data());
        assert!(!HapiError::Format("x".into()).is_too_much_data());
    }

    #[test]
    fn test_io_round_trip_preserves_service_error() {
        let io_err: io::Error = HapiError::from(ServiceError::new(1406, "nope")).into();
        match HapiError::from(io_err) {
            HapiError::Service(e) => assert_eq!(e.code(), 1406),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(HapiError::from(io_err), HapiError::Io(_)));
    }
}
