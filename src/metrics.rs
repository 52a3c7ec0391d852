//! Parsing of the metrics blob curl prints through `--write-out`.
//!
//! curl reports cumulative timestamps for each transfer phase. Versions before
//! 7.61.0 print them as fractional seconds, later versions as whole
//! microseconds. [`parse_metrics`] normalizes both to milliseconds and derives
//! the per-phase ranges from them.

use crate::{Error, Result};
use http::StatusCode;
use serde_json::{Map, Value};

/// The `--write-out` format that makes curl print the metrics as JSON.
pub const WRITE_OUT_FORMAT: &str = r#"{
"time_namelookup": %{time_namelookup},
"time_connect": %{time_connect},
"time_appconnect": %{time_appconnect},
"time_pretransfer": %{time_pretransfer},
"time_redirect": %{time_redirect},
"time_starttransfer": %{time_starttransfer},
"time_total": %{time_total},
"speed_download": %{speed_download},
"speed_upload": %{speed_upload},
"remote_ip": "%{remote_ip}",
"remote_port": "%{remote_port}",
"local_ip": "%{local_ip}",
"local_port": "%{local_port}",
"status_code": "%{http_code}"
}"#;

/// Transfer metrics with every timestamp in milliseconds.
///
/// `time_*` fields are cumulative from the start of the transfer. `range_*`
/// fields are the duration of each individual phase; they are not clamped, so
/// an inconsistent blob shows up as a negative range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMetrics {
    pub time_namelookup: i64,
    pub time_connect: i64,
    pub time_appconnect: i64,
    pub time_pretransfer: i64,
    pub time_redirect: i64,
    pub time_starttransfer: i64,
    pub time_total: i64,

    /// Average download speed in bytes per second.
    pub speed_download: f64,
    /// Average upload speed in bytes per second.
    pub speed_upload: f64,

    pub remote_ip: String,
    pub remote_port: String,
    pub local_ip: String,
    pub local_port: String,
    /// HTTP status as printed by curl; `000` when no response arrived.
    pub status_code: Option<String>,

    pub range_dns: i64,
    pub range_connection: i64,
    pub range_ssl: i64,
    pub range_server: i64,
    pub range_transfer: i64,
}

impl NormalizedMetrics {
    /// Returns the HTTP status, if curl reported a valid one.
    pub fn status_code(&self) -> Option<StatusCode> {
        let code: u16 = self.status_code.as_deref()?.trim().parse().ok()?;
        StatusCode::from_u16(code).ok()
    }

    /// Sum of all phase ranges.
    ///
    /// Equals `time_total` whenever the cumulative timestamps are monotonic.
    pub fn ranges_total(&self) -> i64 {
        self.range_dns
            + self.range_connection
            + self.range_ssl
            + self.range_server
            + self.range_transfer
    }
}

/// Parses curl's metrics JSON into [`NormalizedMetrics`].
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the text is not a JSON object, a required
/// timestamp is missing, or any field has an unsupported type.
///
/// # Examples
///
/// ```
/// use curlstat::metrics::parse_metrics;
///
/// let metrics = parse_metrics(r#"{
///     "time_namelookup": 0.020, "time_connect": 0.045,
///     "time_pretransfer": 0.045, "time_starttransfer": 0.120,
///     "time_total": 0.200, "status_code": "200"
/// }"#).unwrap();
///
/// assert_eq!(metrics.range_connection, 25);
/// assert_eq!(metrics.range_server, 75);
/// assert_eq!(metrics.ranges_total(), metrics.time_total);
/// ```
pub fn parse_metrics(raw: &str) -> Result<NormalizedMetrics> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::error!(error = %e, raw = %raw, "Metrics output is not valid JSON");
        Error::ParseError {
            field: None,
            message: e.to_string(),
        }
    })?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::ParseError {
                field: None,
                message: format!("expected a JSON object, found {}", type_name(&other)),
            })
        }
    };

    let time_namelookup = required_millis(&object, "time_namelookup")?;
    let time_connect = required_millis(&object, "time_connect")?;
    let time_pretransfer = required_millis(&object, "time_pretransfer")?;
    let time_starttransfer = required_millis(&object, "time_starttransfer")?;
    let time_total = required_millis(&object, "time_total")?;

    Ok(NormalizedMetrics {
        time_namelookup,
        time_connect,
        time_appconnect: optional_millis(&object, "time_appconnect")?.unwrap_or(0),
        time_pretransfer,
        time_redirect: optional_millis(&object, "time_redirect")?.unwrap_or(0),
        time_starttransfer,
        time_total,
        speed_download: speed(&object, "speed_download")?,
        speed_upload: speed(&object, "speed_upload")?,
        remote_ip: text(&object, "remote_ip")?.unwrap_or_default(),
        remote_port: text(&object, "remote_port")?.unwrap_or_default(),
        local_ip: text(&object, "local_ip")?.unwrap_or_default(),
        local_port: text(&object, "local_port")?.unwrap_or_default(),
        status_code: text(&object, "status_code")?,
        range_dns: time_namelookup,
        range_connection: time_connect - time_namelookup,
        range_ssl: time_pretransfer - time_connect,
        range_server: time_starttransfer - time_pretransfer,
        range_transfer: time_total - time_starttransfer,
    })
}

/// Converts one curl timestamp to milliseconds.
///
/// Fractional numbers are seconds and whole numbers are microseconds.
fn to_millis(field: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|secs| (secs * 1000.0) as i64)
            .ok_or_else(|| Error::parse(field, "number is out of range")),
        Value::Number(n) => n
            .as_i64()
            .map(|micros| micros / 1000)
            .ok_or_else(|| Error::parse(field, "number is out of range")),
        other => Err(Error::parse(
            field,
            format!("expected a number, found {}", type_name(other)),
        )),
    }
}

fn required_millis(object: &Map<String, Value>, field: &str) -> Result<i64> {
    let value = object
        .get(field)
        .ok_or_else(|| Error::parse(field, "field is missing"))?;
    to_millis(field, value)
}

fn optional_millis(object: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    object.get(field).map(|v| to_millis(field, v)).transpose()
}

fn speed(object: &Map<String, Value>, field: &str) -> Result<f64> {
    match object.get(field) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or_default()),
        Some(other) => Err(Error::parse(
            field,
            format!("expected a number, found {}", type_name(other)),
        )),
    }
}

fn text(object: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(Error::parse(
            field,
            format!("expected a string, found {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
