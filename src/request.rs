//! Request description types.
//!
//! A [`RequestSpec`] is a plain description of one request. It holds no logic
//! of its own; [`build_args`](crate::args::build_args) turns it into curl
//! arguments.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The HTTP methods curl is allowed to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// Every supported method, in canonical order.
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
    ];

    /// Returns the uppercase wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    /// Parses a method name case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use curlstat::Method;
    ///
    /// assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
    /// assert!("FOO".parse::<Method>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Method::ALL.iter().map(Method::as_str).collect();
                crate::Error::ArgumentError(format!(
                    "unsupported method `{}`, expected one of [{}]",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

/// A username/password pair for `--user` or `--proxy-user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub(crate) fn joined(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

/// A file uploaded as a multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// The multipart field name.
    pub field: String,
    /// Path of the file on disk.
    ///
    /// curl also accepts a `;type=...` suffix here, so paths written as
    /// `"client.py;type=text/x-python-script"` keep working.
    pub path: String,
    /// Declared media type, appended as `;type=<media_type>`.
    pub media_type: Option<String>,
}

impl FileAttachment {
    pub fn new(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
            media_type: None,
        }
    }

    /// Sets the declared media type of the attachment.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Renders the `field=@path[;type=...]` form argument.
    pub(crate) fn form_arg(&self) -> String {
        match &self.media_type {
            Some(media_type) => format!("{}=@{};type={}", self.field, self.path, media_type),
            None => format!("{}=@{}", self.field, self.path),
        }
    }
}

/// Description of a single request.
///
/// Build one with [`RequestSpec::builder`]. Once built it is never modified;
/// precedence between query parameters, form data and JSON bodies is resolved
/// when arguments are built, not here.
///
/// # Examples
///
/// ```
/// use curlstat::{Credentials, RequestSpec};
///
/// let spec = RequestSpec::builder("https://api.example.com/search")
///     .method("get")
///     .header("Accept", "application/json")
///     .query("q", "rust")
///     .query("page", 2)
///     .auth(Credentials::new("alice", "secret"))
///     .connect_timeout(5)
///     .build();
///
/// assert_eq!(spec.url, "https://api.example.com/search");
/// assert!(spec.insecure);
/// assert!(spec.follow_redirects);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Raw method name. `None` means GET.
    pub method: Option<String>,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Query parameters; values are JSON scalars.
    pub query: Vec<(String, Value)>,
    /// Form fields; values are JSON scalars or arrays of scalars.
    pub form: Vec<(String, Value)>,
    /// JSON body. `null`, `{}` and `[]` count as absent.
    pub json: Option<Value>,
    pub files: Vec<FileAttachment>,
    pub auth: Option<Credentials>,
    pub proxy: Option<String>,
    pub proxy_auth: Option<Credentials>,
    /// Skip TLS certificate verification (`-k`).
    pub insecure: bool,
    /// Follow redirects (`-L`).
    pub follow_redirects: bool,
    /// Transfer rate cap in curl syntax, e.g. `200k`.
    pub limit_rate: Option<String>,
    /// Connect timeout in seconds.
    ///
    /// This bounds connection setup only, never the whole transfer.
    pub connect_timeout: Option<u64>,
}

impl RequestSpec {
    /// Starts building a request for `url`.
    pub fn builder(url: impl Into<String>) -> RequestSpecBuilder {
        RequestSpecBuilder::new(url)
    }
}

/// Builder for [`RequestSpec`].
#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    spec: RequestSpec,
}

impl RequestSpecBuilder {
    /// Creates a builder with the default flags (`insecure` and
    /// `follow_redirects` both on).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            spec: RequestSpec {
                method: None,
                url: url.into(),
                headers: Vec::new(),
                query: Vec::new(),
                form: Vec::new(),
                json: None,
                files: Vec::new(),
                auth: None,
                proxy: None,
                proxy_auth: None,
                insecure: true,
                follow_redirects: true,
                limit_rate: None,
                connect_timeout: None,
            },
        }
    }

    /// Sets the method. Validation happens when arguments are built.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.spec.method = Some(method.into());
        self
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec.query.push((key.into(), value.into()));
        self
    }

    /// Adds a form field. Pass a `Vec` to send the field several times.
    pub fn form(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec.form.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.spec.json = Some(body);
        self
    }

    /// Adds a file attachment.
    pub fn file(mut self, attachment: FileAttachment) -> Self {
        self.spec.files.push(attachment);
        self
    }

    pub fn auth(mut self, credentials: Credentials) -> Self {
        self.spec.auth = Some(credentials);
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.spec.proxy = Some(proxy.into());
        self
    }

    pub fn proxy_auth(mut self, credentials: Credentials) -> Self {
        self.spec.proxy_auth = Some(credentials);
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.spec.insecure = insecure;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.spec.follow_redirects = follow;
        self
    }

    pub fn limit_rate(mut self, rate: impl Into<String>) -> Self {
        self.spec.limit_rate = Some(rate.into());
        self
    }

    /// Sets the connect timeout in seconds.
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.spec.connect_timeout = Some(secs);
        self
    }

    pub fn build(self) -> RequestSpec {
        self.spec
    }
}
