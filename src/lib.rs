//! # curlstat - HTTP requests through curl, with a timing breakdown
//!
//! curlstat runs a single HTTP request through the `curl` binary and returns
//! the response together with a per-phase timing breakdown: DNS lookup, TCP
//! connection, TLS handshake, server processing and content transfer. The
//! breakdown is also rendered as a timeline chart.
//!
//! ## Quick Start
//!
//! ```no_run
//! use curlstat::{FileAttachment, RequestSpec};
//!
//! fn main() -> Result<(), curlstat::Error> {
//!     // Query parameters
//!     let spec = RequestSpec::builder("https://httpbin.org/get")
//!         .query("name", "Django")
//!         .build();
//!     let record = curlstat::request(&spec)?;
//!     println!("{}", record.timeline);
//!     println!("{} -> {}", record.command, record.status);
//!
//!     // Form fields plus a file upload, sent as multipart
//!     let spec = RequestSpec::builder("https://httpbin.org/post")
//!         .method("POST")
//!         .form("name", "GGBond")
//!         .form("ages", vec!["1", "3"])
//!         .file(FileAttachment::new("file", "Cargo.toml").with_media_type("text/plain"))
//!         .build();
//!     let record = curlstat::request(&spec)?;
//!     let echoed: serde_json::Value = record.json()?;
//!     println!("{}", echoed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Request builder** - Headers, query parameters, forms, JSON bodies, file uploads, auth and proxies
//! - **Deterministic arguments** - The same request always produces the same curl command line
//! - **Timing breakdown** - Phase durations in milliseconds, for both old (seconds) and new (microseconds) curl versions
//! - **Timeline chart** - A five-phase chart for HTTPS, four phases for plain HTTP, optionally colored
//! - **Replayable commands** - Every record carries the shell command that produced it
//! - **Structured logging** - Diagnostics through `tracing`
//!
//! ## Error Handling
//!
//! A broken request description fails before curl runs. A curl that fails to
//! start or exits abnormally does not fail the call; the failure is recorded
//! on the [`ResponseRecord`] instead:
//!
//! ```no_run
//! use curlstat::{Error, RequestSpec};
//!
//! # fn example() -> Result<(), Error> {
//! let spec = RequestSpec::builder("http://127.0.0.1:9/").connect_timeout(2).build();
//! let record = curlstat::request(&spec)?;
//!
//! if let Some(Error::ProcessError { exit_code, stderr }) = record.process_error() {
//!     eprintln!("curl exited with {:?}: {}", exit_code, stderr);
//! }
//! # Ok(())
//! # }
//! ```

pub mod args;
mod client;
mod error;
pub mod executor;
pub mod metrics;
mod report;
mod request;
mod response;

pub use args::{build_args, ArgumentVector};
pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use executor::{CurlExecutor, TransferExecutor};
pub use metrics::{parse_metrics, NormalizedMetrics};
pub use report::TimelineFormatter;
pub use request::{Credentials, FileAttachment, Method, RequestSpec, RequestSpecBuilder};
pub use response::ResponseRecord;

/// Runs one request with a default [`Client`].
///
/// Equivalent to `Client::default().send(spec)`.
pub fn request(spec: &RequestSpec) -> Result<ResponseRecord> {
    Client::default().send(spec)
}
