//! Running the transfer tool.
//!
//! [`TransferExecutor`] is the seam between this crate and the process that
//! actually moves bytes. [`CurlExecutor`] runs a real `curl`; tests and
//! embedders can plug in their own implementation.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

/// Everything needed to run one transfer.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Program to run, e.g. `curl` or an absolute path to it.
    pub program: &'a str,
    /// Request arguments, ending with the URL.
    pub args: &'a [String],
    /// `--write-out` format for the metrics blob.
    pub write_out: &'a str,
    /// Where response headers must be written.
    pub header_path: &'a Path,
    /// Where the response body must be written.
    pub body_path: &'a Path,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Standard output; the metrics blob on success.
    pub stdout: String,
    /// Standard error; curl's diagnostics.
    pub stderr: String,
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a transfer and reports what the process printed.
///
/// Implementations block until the transfer finishes. They write headers and
/// body to the paths in the [`Invocation`] and must not interpret the metrics
/// blob themselves.
///
/// # Examples
///
/// ```
/// use curlstat::executor::{Invocation, ProcessOutput, TransferExecutor};
///
/// struct Offline;
///
/// impl TransferExecutor for Offline {
///     fn execute(&self, _invocation: &Invocation<'_>) -> std::io::Result<ProcessOutput> {
///         Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no network"))
///     }
/// }
/// ```
pub trait TransferExecutor: Send + Sync {
    /// Runs the transfer described by `invocation`.
    ///
    /// An `Err` means the process could not be started at all.
    fn execute(&self, invocation: &Invocation<'_>) -> std::io::Result<ProcessOutput>;
}

/// Runs a real curl binary with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlExecutor;

impl CurlExecutor {
    /// Full argument list: output capture flags first, then the request.
    pub fn command_args(invocation: &Invocation<'_>) -> Vec<String> {
        let mut args = vec![
            "-w".to_string(),
            invocation.write_out.to_string(),
            "-D".to_string(),
            invocation.header_path.display().to_string(),
            "-o".to_string(),
            invocation.body_path.display().to_string(),
            "-s".to_string(),
            "-S".to_string(),
        ];
        args.extend(invocation.args.iter().cloned());
        args
    }
}

impl TransferExecutor for CurlExecutor {
    fn execute(&self, invocation: &Invocation<'_>) -> std::io::Result<ProcessOutput> {
        let output = Command::new(invocation.program)
            .args(Self::command_args(invocation))
            .output()?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// The header and body files of one transfer.
///
/// Both files are deleted when this value is dropped, on every exit path.
#[derive(Debug)]
pub struct TransferFiles {
    headers: NamedTempFile,
    body: NamedTempFile,
}

impl TransferFiles {
    /// Creates two fresh, empty temporary files.
    pub fn new() -> Result<Self> {
        let headers = allocate("curlstat-headers-")?;
        let body = allocate("curlstat-body-")?;
        Ok(Self { headers, body })
    }

    pub fn header_path(&self) -> &Path {
        self.headers.path()
    }

    pub fn body_path(&self) -> &Path {
        self.body.path()
    }

    /// Reads the header file, trimmed.
    pub fn read_headers(&self) -> Result<String> {
        read_trimmed(self.header_path())
    }

    /// Reads the body file, trimmed.
    pub fn read_body(&self) -> Result<String> {
        read_trimmed(self.body_path())
    }
}

fn allocate(prefix: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempfile()
        .map_err(|e| Error::file(std::env::temp_dir().join(prefix), e))
}

fn read_trimmed(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::file(PathBuf::from(path), e))?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}
