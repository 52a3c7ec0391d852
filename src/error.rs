//! Error types for curl-backed requests.
//!
//! Every failure mode of a request has its own variant so callers can branch
//! on exactly what went wrong. Argument, parse, decode and file errors are
//! returned as `Err`. A [`Error::ProcessError`] is the one recoverable kind:
//! it is attached to the [`ResponseRecord`](crate::ResponseRecord) instead of
//! aborting the call, so partial results stay inspectable.

use http::StatusCode;
use std::path::PathBuf;

/// The main error type for curl-backed requests.
///
/// # Examples
///
/// ```no_run
/// use curlstat::{Error, RequestSpec};
///
/// # fn example() -> Result<(), Error> {
/// let spec = RequestSpec::builder("https://api.example.com/users/1").build();
///
/// match curlstat::request(&spec) {
///     Ok(record) => match record.json::<serde_json::Value>() {
///         Ok(value) => println!("Decoded: {}", value),
///         Err(Error::DecodeError { raw_body, serde_error, .. }) => {
///             eprintln!("Body is not JSON ({}): {}", serde_error, raw_body);
///         }
///         Err(e) => eprintln!("Other error: {}", e),
///     },
///     Err(Error::ArgumentError(msg)) => eprintln!("Bad request: {}", msg),
///     Err(e) => eprintln!("Request failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request description is invalid (empty URL, unsupported method).
    ///
    /// Raised before any temporary file is created or any process is spawned.
    #[error("Invalid request: {0}")]
    ArgumentError(String),

    /// The transfer tool could not be started, or exited abnormally.
    ///
    /// This variant is never returned as `Err` from
    /// [`Client::send`](crate::Client::send); it is carried on the record.
    ///
    /// # Fields
    ///
    /// * `exit_code` - The exit code, or `None` if the process never ran or was killed
    /// * `stderr` - What the process wrote to standard error, or the spawn failure
    #[error("Transfer process failed (exit code {exit_code:?}): {stderr}")]
    ProcessError {
        /// The process exit code, if it exited normally
        exit_code: Option<i32>,
        /// Standard error output or spawn failure description
        stderr: String,
    },

    /// The metrics blob printed by the transfer tool could not be understood.
    ///
    /// # Fields
    ///
    /// * `field` - The offending metrics field, or `None` if the blob is not JSON at all
    /// * `message` - What was wrong with it
    #[error("Failed to parse transfer metrics{}: {message}", field_suffix(.field))]
    ParseError {
        /// The offending field
        field: Option<String>,
        /// Description of the problem
        message: String,
    },

    /// The response body could not be decoded as the requested JSON type.
    ///
    /// # Fields
    ///
    /// * `raw_body` - The raw response body
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code of the response
    #[error("Failed to decode response body (status {status}): {serde_error}")]
    DecodeError {
        /// The raw response body that failed to decode
        raw_body: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A temporary output file could not be created or read back.
    #[error("Temporary file error at {}: {source}", .path.display())]
    FileError {
        /// The file involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this error is reported on the record rather than
    /// aborting the call.
    ///
    /// # Examples
    ///
    /// ```
    /// use curlstat::Error;
    ///
    /// let err = Error::ProcessError { exit_code: Some(7), stderr: "Failed to connect".into() };
    /// assert!(err.is_recoverable());
    ///
    /// let err = Error::ArgumentError("url required".into());
    /// assert!(!err.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ProcessError { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DecodeError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::DecodeError { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }

    pub(crate) fn parse(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ParseError {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileError {
            path: path.into(),
            source,
        }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" (field `{}`)", f))
        .unwrap_or_default()
}

/// A specialized `Result` type for curl-backed requests.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_field() {
        let err = Error::parse("time_namelookup", "expected a number, found string");
        let msg = err.to_string();
        assert!(msg.contains("time_namelookup"));
        assert!(msg.contains("found string"));
    }

    #[test]
    fn test_parse_error_without_field() {
        let err = Error::ParseError {
            field: None,
            message: "EOF while parsing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse transfer metrics: EOF while parsing"
        );
    }

    #[test]
    fn test_decode_error_accessors() {
        let err = Error::DecodeError {
            raw_body: "not json".to_string(),
            serde_error: "expected value".to_string(),
            status: StatusCode::OK,
        };
        assert_eq!(err.status(), Some(StatusCode::OK));
        assert_eq!(err.raw_body(), Some("not json"));
        assert!(!err.is_recoverable());
    }
}
