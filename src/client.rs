//! Client that runs requests through curl.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] to pick
//! the curl binary, timeline colors, or a custom [`TransferExecutor`].

use crate::args::{build_args, ArgumentVector};
use crate::executor::{CurlExecutor, Invocation, TransferExecutor, TransferFiles};
use crate::metrics::{parse_metrics, NormalizedMetrics, WRITE_OUT_FORMAT};
use crate::report::{TimelineFormatter, DEFAULT_COLOR};
use crate::{Error, RequestSpec, ResponseRecord, Result};
use std::sync::Arc;

/// A client that issues requests through an external curl process.
///
/// Requests are synchronous: [`send`](Client::send) blocks the calling thread
/// until curl exits. No total timeout is enforced here; the only timeout is
/// the connect timeout passed through from the [`RequestSpec`]. Wrap the call
/// if a deadline on the whole transfer is needed.
///
/// # Failure policy
///
/// * Invalid requests fail with [`Error::ArgumentError`] before anything runs.
/// * If curl cannot be started or exits abnormally, the call still succeeds:
///   the record carries the failure in
///   [`process_error`](ResponseRecord::process_error) and a `500` status.
///   Metrics printed by a failed process are used when they parse and
///   dropped when they do not.
/// * Unparsable metrics from a clean exit ([`Error::ParseError`]) and
///   unreadable output files ([`Error::FileError`]) are returned as errors.
///
/// # Examples
///
/// ```no_run
/// use curlstat::{Client, RequestSpec};
/// use serde_json::json;
///
/// # fn example() -> Result<(), curlstat::Error> {
/// let client = Client::builder()
///     .program("/usr/bin/curl")
///     .color(false)
///     .build();
///
/// let spec = RequestSpec::builder("https://httpbin.org/post")
///     .method("POST")
///     .json(json!({"name": "Alice"}))
///     .build();
///
/// let record = client.send(&spec)?;
/// println!("{}", record.timeline);
/// println!("{}", record.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    program: String,
    formatter: TimelineFormatter,
    executor: Box<dyn TransferExecutor>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Runs one request and collects the response, metrics and timeline.
    ///
    /// The header and body temporary files exist only for the duration of
    /// this call and are removed on every exit path.
    pub fn send(&self, spec: &RequestSpec) -> Result<ResponseRecord> {
        let args = build_args(spec)?;
        let command = args.command_line(&self.inner.program);
        let files = TransferFiles::new()?;

        tracing::debug!(command = %command, "Executing curl");

        let invocation = Invocation {
            program: &self.inner.program,
            args: args.as_slice(),
            write_out: WRITE_OUT_FORMAT,
            header_path: files.header_path(),
            body_path: files.body_path(),
        };

        let output = match self.inner.executor.execute(&invocation) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    program = %self.inner.program,
                    "Failed to start transfer process"
                );
                let error = Error::ProcessError {
                    exit_code: None,
                    stderr: e.to_string(),
                };
                return Ok(ResponseRecord::new(command).with_process_error(error));
            }
        };

        let mut record = ResponseRecord::new(command);
        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            tracing::warn!(stderr = %stderr, exit_code = ?output.exit_code, "curl reported errors");
            record.error = Some(stderr.to_string());
        }

        if !output.succeeded() {
            record = record.with_process_error(Error::ProcessError {
                exit_code: output.exit_code,
                stderr: stderr.to_string(),
            });
            if output.stdout.trim().is_empty() {
                return Ok(record);
            }
        }

        let metrics = match parse_metrics(&output.stdout) {
            Ok(metrics) => metrics,
            // A failed process may leave a truncated blob; keep the process error.
            Err(e) if record.process_error().is_some() => {
                tracing::warn!(
                    error = %e,
                    exit_code = ?output.exit_code,
                    "Discarding metrics from failed transfer"
                );
                return Ok(record);
            }
            Err(e) => return Err(e),
        };

        self.assemble(record, &args, metrics, &files)
    }

    /// Fills a record from curl's metrics and output files.
    fn assemble(
        &self,
        mut record: ResponseRecord,
        args: &ArgumentVector,
        metrics: NormalizedMetrics,
        files: &TransferFiles,
    ) -> Result<ResponseRecord> {
        record.status = metrics
            .status_code()
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        record.timeline = self.inner.formatter.render(&metrics, args.url());
        record.headers = files.read_headers()?;
        record.body = files.read_body()?;

        tracing::info!(
            status = record.status.as_u16(),
            total_ms = metrics.time_total,
            remote_ip = %metrics.remote_ip,
            "Received curl response"
        );

        record.metrics = Some(metrics);
        Ok(record)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```
/// use curlstat::ClientBuilder;
///
/// let client = ClientBuilder::new()
///     .program("curl")
///     .color_code(33)
///     .build();
/// ```
pub struct ClientBuilder {
    program: String,
    color: bool,
    color_code: u8,
    executor: Option<Box<dyn TransferExecutor>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings: `curl` from the
    /// `PATH`, cyan timeline values.
    pub fn new() -> Self {
        Self {
            program: "curl".to_string(),
            color: true,
            color_code: DEFAULT_COLOR,
            executor: None,
        }
    }

    /// Sets the curl program name or path.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Enables or disables terminal colors in the timeline.
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Sets the ANSI color code for timeline values and enables color.
    pub fn color_code(mut self, code: u8) -> Self {
        self.color = true;
        self.color_code = code;
        self
    }

    /// Replaces the process runner.
    ///
    /// By default a [`CurlExecutor`] is used.
    pub fn executor(mut self, executor: Box<dyn TransferExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Builds the configured `Client`.
    pub fn build(self) -> Client {
        let formatter = TimelineFormatter::new(self.color.then_some(self.color_code));
        let executor = self.executor.unwrap_or_else(|| Box::new(CurlExecutor));

        Client {
            inner: Arc::new(ClientInner {
                program: self.program,
                formatter,
                executor,
            }),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Client {
    fn default() -> Self {
        ClientBuilder::new().build()
    }
}
