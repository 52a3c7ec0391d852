//! The result of one curl-backed request.
//!
//! A [`ResponseRecord`] keeps the raw response text alongside the transfer
//! metrics, the rendered timeline and the command line that produced them,
//! so a request can be inspected or replayed from a shell.

use crate::metrics::NormalizedMetrics;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

/// Everything known about one request.
///
/// A record is returned even when curl itself failed, so partial results can
/// be inspected. In that case [`process_error`](Self::process_error) is set
/// and the status defaults to `500`.
///
/// # Examples
///
/// ```no_run
/// use curlstat::RequestSpec;
///
/// # fn example() -> Result<(), curlstat::Error> {
/// let spec = RequestSpec::builder("https://api.example.com/users/123").build();
/// let record = curlstat::request(&spec)?;
///
/// println!("{}", record.timeline);
/// println!("Status: {}", record.status);
/// println!("Replay with: {}", record.command);
///
/// if let Some(err) = record.process_error() {
///     eprintln!("curl failed: {}", err);
/// }
///
/// let user: serde_json::Value = record.json()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResponseRecord {
    /// The HTTP status code, or `500` if curl reported none.
    pub status: StatusCode,

    /// The response body, trimmed of surrounding whitespace.
    pub body: String,

    /// The raw response header text, trimmed. When redirects were followed
    /// this holds every header block in order.
    pub headers: String,

    /// Anything curl wrote to standard error. Not fatal on its own.
    pub error: Option<String>,

    /// The rendered phase timeline. Empty if no metrics were available.
    pub timeline: String,

    /// The command line that was run, with header and data values quoted.
    pub command: String,

    /// Normalized transfer metrics, if curl printed them.
    pub metrics: Option<NormalizedMetrics>,

    process_error: Option<Error>,
}

impl ResponseRecord {
    pub(crate) fn new(command: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
            headers: String::new(),
            error: None,
            timeline: String::new(),
            command,
            metrics: None,
            process_error: None,
        }
    }

    pub(crate) fn with_process_error(mut self, error: Error) -> Self {
        self.process_error = Some(error);
        self
    }

    /// Returns the process failure, if curl could not run or exited abnormally.
    pub fn process_error(&self) -> Option<&Error> {
        self.process_error.as_ref()
    }

    /// Returns `true` for a 2xx status from a cleanly exited process.
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.process_error.is_none()
    }

    /// Returns the raw response body.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] with the raw body if it does not
    /// deserialize into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_body = %self.body,
                "Failed to decode response body"
            );
            Error::DecodeError {
                raw_body: self.body.clone(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }

    /// Parses the final header block into a [`HeaderMap`].
    ///
    /// Earlier blocks from redirects or `100 Continue` responses are skipped,
    /// as are lines that are not valid headers.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for line in final_block(&self.headers).lines().skip(1) {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.trim().as_bytes()),
                HeaderValue::from_str(value.trim()),
            ) {
                map.append(name, value);
            }
        }
        map
    }

    /// Returns a header value from the final header block, by case-insensitive name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use curlstat::ResponseRecord;
    /// let record = ResponseRecord::from_parts(
    ///     http::StatusCode::OK,
    ///     "HTTP/1.1 301 Moved\r\nLocation: /b\r\n\r\nHTTP/1.1 200 OK\r\nContent-Type: text/plain",
    ///     "hi",
    /// );
    ///
    /// assert_eq!(record.header("content-type").as_deref(), Some("text/plain"));
    /// assert_eq!(record.header("location"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<String> {
        self.header_map()
            .get(name)?
            .to_str()
            .ok()
            .map(str::to_string)
    }

    /// Builds a record from already known response parts, without metrics.
    pub fn from_parts(status: StatusCode, headers: impl Into<String>, body: impl Into<String>) -> Self {
        let mut record = Self::new(String::new());
        record.status = status;
        record.headers = headers.into();
        record.body = body.into();
        record
    }
}

fn final_block(headers: &str) -> &str {
    let start = headers
        .rfind("\r\n\r\n")
        .map(|i| i + 4)
        .into_iter()
        .chain(headers.rfind("\n\n").map(|i| i + 2))
        .max()
        .unwrap_or(0);
    &headers[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        name: String,
    }

    #[test]
    fn test_defaults_to_internal_server_error() {
        let record = ResponseRecord::new("curl http://x/".to_string());
        assert_eq!(record.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!record.is_success());
        assert!(record.process_error().is_none());
    }

    #[test]
    fn test_json_decodes_body() {
        let record = ResponseRecord::from_parts(StatusCode::OK, "", r#"{"name": "22"}"#);
        let greeting: Greeting = record.json().unwrap();
        assert_eq!(greeting.name, "22");
        assert_eq!(record.text(), r#"{"name": "22"}"#);
    }

    #[test]
    fn test_json_failure_propagates() {
        let record = ResponseRecord::from_parts(StatusCode::OK, "", "<html>oops</html>");
        match record.json::<Greeting>() {
            Err(Error::DecodeError {
                raw_body, status, ..
            }) => {
                assert_eq!(raw_body, "<html>oops</html>");
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected DecodeError, got {:?}", other),
        }
    }

    #[test]
    fn test_header_map_uses_last_block() {
        let headers = "HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Type: application/json\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2";
        let record = ResponseRecord::from_parts(StatusCode::OK, headers, "{}");
        let map = record.header_map();

        assert_eq!(map.get("content-type").unwrap(), "application/json");
        assert_eq!(map.get_all("set-cookie").iter().count(), 2);
        assert_eq!(record.header("Content-Type").as_deref(), Some("application/json"));
    }

    #[test]
    fn test_header_map_single_block() {
        let record =
            ResponseRecord::from_parts(StatusCode::OK, "HTTP/1.1 200 OK\nServer: test\nbroken", "");
        let map = record.header_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("server").unwrap(), "test");
    }

    #[test]
    fn test_process_error_blocks_success() {
        let mut record = ResponseRecord::new(String::new()).with_process_error(Error::ProcessError {
            exit_code: Some(7),
            stderr: "Failed to connect".to_string(),
        });
        record.status = StatusCode::OK;
        assert!(!record.is_success());
        assert!(record.process_error().unwrap().is_recoverable());
    }
}
