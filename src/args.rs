//! Translation of a [`RequestSpec`] into curl arguments.
//!
//! Arguments are assembled by an ordered pipeline of steps. Some steps drop
//! request fields that earlier ones left in place: query parameters win over
//! any body, and form data wins over a JSON body. Those overrides are applied
//! to a private working copy, never to the caller's `RequestSpec`.

use crate::request::{Method, RequestSpec};
use crate::{Error, Result};
use serde_json::Value;
use url::{form_urlencoded, Url};

/// Flags whose following argument is quoted in a reconstructed command line.
const QUOTED_FLAGS: [&str; 5] = ["-H", "-d", "-F", "--form-string", "--data-raw"];

/// The ordered arguments handed to curl, ending with the request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    args: Vec<String>,
}

impl ArgumentVector {
    /// Returns the arguments in order.
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    /// Returns the final URL, including any appended query string.
    pub fn url(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }

    /// Reconstructs a shareable shell command line.
    ///
    /// Header, data and form values are single-quoted.
    ///
    /// # Examples
    ///
    /// ```
    /// use curlstat::{args::build_args, RequestSpec};
    ///
    /// let spec = RequestSpec::builder("http://localhost/x")
    ///     .header("Accept", "text/plain")
    ///     .follow_redirects(false)
    ///     .insecure(false)
    ///     .build();
    /// let args = build_args(&spec).unwrap();
    ///
    /// assert_eq!(
    ///     args.command_line("curl"),
    ///     "curl -X GET -H 'Accept: text/plain' http://localhost/x"
    /// );
    /// ```
    pub fn command_line(&self, program: &str) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(program.to_string());
        let mut quote_next = false;
        for arg in &self.args {
            if quote_next {
                parts.push(shell_quote(arg));
            } else {
                parts.push(arg.clone());
            }
            quote_next = QUOTED_FLAGS.contains(&arg.as_str());
        }
        parts.join(" ")
    }
}

impl AsRef<[String]> for ArgumentVector {
    fn as_ref(&self) -> &[String] {
        &self.args
    }
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Working state of the pipeline: the fields that precedence rules may drop,
/// plus the arguments emitted so far.
struct Resolved<'a> {
    spec: &'a RequestSpec,
    url: String,
    form: &'a [(String, Value)],
    json: Option<&'a Value>,
    explicit_content_type: bool,
    args: Vec<String>,
}

impl Resolved<'_> {
    fn push(&mut self, flag: &str, value: impl Into<String>) {
        self.args.push(flag.to_string());
        self.args.push(value.into());
    }
}

type Step = fn(&mut Resolved<'_>);

/// Assembly steps, applied in this exact order.
const PIPELINE: [Step; 12] = [
    headers,
    query,
    form,
    json_body,
    auto_content_type,
    files,
    auth,
    proxy,
    insecure,
    redirects,
    limit_rate,
    connect_timeout,
];

/// Validates `spec` and builds the curl argument vector for it.
///
/// # Errors
///
/// Returns [`Error::ArgumentError`] if the URL is empty or the method is not
/// one of the supported [`Method`]s.
///
/// # Examples
///
/// ```
/// use curlstat::{args::build_args, RequestSpec};
///
/// let spec = RequestSpec::builder("http://localhost/search")
///     .query("a", "1")
///     .form("ignored", "x")
///     .build();
/// let args = build_args(&spec).unwrap();
///
/// assert_eq!(args.url(), "http://localhost/search?a=1");
/// assert!(!args.as_slice().contains(&"-d".to_string()));
/// ```
pub fn build_args(spec: &RequestSpec) -> Result<ArgumentVector> {
    if spec.url.is_empty() {
        return Err(Error::ArgumentError("url required".to_string()));
    }
    let method: Method = spec.method.as_deref().unwrap_or("GET").parse()?;

    let mut state = Resolved {
        spec,
        url: spec.url.clone(),
        form: &spec.form,
        json: spec.json.as_ref().filter(|v| has_content(v)),
        explicit_content_type: false,
        args: vec!["-X".to_string(), method.as_str().to_string()],
    };

    for step in PIPELINE {
        step(&mut state);
    }

    let mut args = state.args;
    args.push(state.url);

    tracing::debug!(method = %method, args = args.len(), "Built curl arguments");

    Ok(ArgumentVector { args })
}

/// Null and empty containers count as no JSON body.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn headers(state: &mut Resolved<'_>) {
    let spec = state.spec;
    for (name, value) in &spec.headers {
        state.push("-H", format!("{}: {}", name, value));
        if name.eq_ignore_ascii_case("content-type") {
            state.explicit_content_type = true;
        }
    }
}

fn query(state: &mut Resolved<'_>) {
    if state.spec.query.is_empty() {
        return;
    }
    let spec = state.spec;
    match Url::parse(&state.url) {
        Ok(mut url) => {
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in &spec.query {
                    pairs.append_pair(key, &scalar_text(value));
                }
            }
            state.url = url.to_string();
        }
        Err(e) => {
            tracing::debug!(error = %e, url = %state.url, "Appending query to unparsed URL");
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &spec.query {
                serializer.append_pair(key, &scalar_text(value));
            }
            let (base, fragment) = match state.url.split_once('#') {
                Some((base, fragment)) => (base, Some(fragment)),
                None => (state.url.as_str(), None),
            };
            let separator = if base.contains('?') { '&' } else { '?' };
            let mut joined = format!("{}{}{}", base, separator, serializer.finish());
            if let Some(fragment) = fragment {
                joined.push('#');
                joined.push_str(fragment);
            }
            state.url = joined;
        }
    }
    state.form = &[];
    state.json = None;
}

fn form(state: &mut Resolved<'_>) {
    let fields = state.form;
    if fields.is_empty() {
        return;
    }
    if state.spec.files.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            for item in form_values(value) {
                serializer.append_pair(key, &item);
            }
        }
        state.push("-d", serializer.finish());
    } else {
        for (key, value) in fields {
            for item in form_values(value) {
                state.push("--form-string", format!("{}={}", key, item));
            }
        }
    }
    state.json = None;
}

fn json_body(state: &mut Resolved<'_>) {
    if let Some(body) = state.json {
        state.push("--data-raw", body.to_string());
    }
}

fn auto_content_type(state: &mut Resolved<'_>) {
    if state.explicit_content_type {
        return;
    }
    let content_type = if state.json.is_some() {
        "application/json"
    } else if !state.spec.files.is_empty() {
        "multipart/form-data"
    } else if !state.form.is_empty() {
        "application/x-www-form-urlencoded"
    } else {
        return;
    };
    state.push("-H", format!("Content-Type: {}", content_type));
}

fn files(state: &mut Resolved<'_>) {
    let spec = state.spec;
    for attachment in &spec.files {
        state.push("-F", attachment.form_arg());
    }
}

fn auth(state: &mut Resolved<'_>) {
    let spec = state.spec;
    if let Some(credentials) = &spec.auth {
        state.push("--user", credentials.joined());
    }
}

fn proxy(state: &mut Resolved<'_>) {
    let spec = state.spec;
    if let Some(proxy) = &spec.proxy {
        state.push("-x", proxy.clone());
        if let Some(credentials) = &spec.proxy_auth {
            state.push("--proxy-user", credentials.joined());
        }
    }
}

fn insecure(state: &mut Resolved<'_>) {
    if state.spec.insecure {
        state.args.push("-k".to_string());
    }
}

fn redirects(state: &mut Resolved<'_>) {
    if state.spec.follow_redirects {
        state.args.push("-L".to_string());
    }
}

fn limit_rate(state: &mut Resolved<'_>) {
    let spec = state.spec;
    if let Some(rate) = &spec.limit_rate {
        state.push("--limit-rate", rate.clone());
    }
}

fn connect_timeout(state: &mut Resolved<'_>) {
    if let Some(secs) = state.spec.connect_timeout {
        state.push("--connect-timeout", secs.to_string());
    }
}

/// Text of a scalar JSON value as it should appear in a query or form.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A form value expands to one item per array element.
fn form_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect(),
        other => vec![scalar_text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Credentials, FileAttachment};
    use serde_json::json;

    fn args_of(spec: &RequestSpec) -> Vec<String> {
        build_args(spec).unwrap().as_slice().to_vec()
    }

    fn bare(url: &str) -> crate::request::RequestSpecBuilder {
        RequestSpec::builder(url).insecure(false).follow_redirects(false)
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let spec = RequestSpec::builder("").build();
        match build_args(&spec) {
            Err(Error::ArgumentError(msg)) => assert_eq!(msg, "url required"),
            other => panic!("Expected ArgumentError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let spec = RequestSpec::builder("http://localhost").method("FOO").build();
        match build_args(&spec) {
            Err(Error::ArgumentError(msg)) => {
                assert!(msg.contains("GET"));
                assert!(msg.contains("PATCH"));
            }
            other => panic!("Expected ArgumentError, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_to_get_with_flags() {
        let spec = RequestSpec::builder("http://localhost/").build();
        assert_eq!(args_of(&spec), ["-X", "GET", "-k", "-L", "http://localhost/"]);
    }

    #[test]
    fn test_method_is_uppercased() {
        let spec = bare("http://localhost/").method("post").build();
        assert_eq!(args_of(&spec)[..2], ["-X", "POST"]);
    }

    #[test]
    fn test_query_params_clear_bodies() {
        let spec = bare("http://localhost/get")
            .query("a", "1")
            .form("name", "D")
            .json(json!({"k": "v"}))
            .build();
        let args = build_args(&spec).unwrap();

        assert!(args.url().ends_with("?a=1"));
        assert_eq!(args.as_slice(), ["-X", "GET", "http://localhost/get?a=1"]);
    }

    #[test]
    fn test_query_goes_before_fragment() {
        let spec = bare("http://h/p#x").query("a", "1").build();
        assert_eq!(build_args(&spec).unwrap().url(), "http://h/p?a=1#x");

        let spec = bare("http://h/p?b=2#x").query("a", "1").build();
        assert_eq!(build_args(&spec).unwrap().url(), "http://h/p?b=2&a=1#x");
    }

    #[test]
    fn test_query_on_unparsable_url_keeps_fragment() {
        let spec = bare("localhost/p#x").query("a", "b c").build();
        assert_eq!(build_args(&spec).unwrap().url(), "localhost/p?a=b+c#x");
    }

    #[test]
    fn test_query_appends_to_existing_query_string() {
        let spec = bare("http://localhost/get?x=0")
            .query("name", "Django Rust")
            .query("n", 3)
            .query("flag", true)
            .build();
        assert_eq!(
            build_args(&spec).unwrap().url(),
            "http://localhost/get?x=0&name=Django+Rust&n=3&flag=true"
        );
    }

    #[test]
    fn test_urlencoded_form() {
        let spec = bare("http://localhost/post")
            .method("POST")
            .form("name", "D")
            .form("ages", vec!["1", "3"])
            .build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "POST",
                "-d",
                "name=D&ages=1&ages=3",
                "-H",
                "Content-Type: application/x-www-form-urlencoded",
                "http://localhost/post",
            ]
        );
    }

    #[test]
    fn test_form_with_files_becomes_multipart() {
        let spec = bare("http://localhost/upload")
            .method("POST")
            .form("name", "D")
            .file(FileAttachment::new("doc", "x.txt"))
            .build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "POST",
                "--form-string",
                "name=D",
                "-H",
                "Content-Type: multipart/form-data",
                "-F",
                "doc=@x.txt",
                "http://localhost/upload",
            ]
        );
    }

    #[test]
    fn test_form_clears_json() {
        let spec = bare("http://localhost/")
            .form("name", "D")
            .json(json!({"name": "J"}))
            .build();
        let args = args_of(&spec);
        assert!(!args.contains(&"--data-raw".to_string()));
        assert!(args.contains(&"Content-Type: application/x-www-form-urlencoded".to_string()));
    }

    #[test]
    fn test_json_body() {
        let spec = bare("http://localhost/json")
            .method("POST")
            .json(json!({"name": "22"}))
            .build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "POST",
                "--data-raw",
                r#"{"name":"22"}"#,
                "-H",
                "Content-Type: application/json",
                "http://localhost/json",
            ]
        );
    }

    #[test]
    fn test_null_json_is_absent() {
        let spec = bare("http://localhost/").json(Value::Null).build();
        assert_eq!(args_of(&spec), ["-X", "GET", "http://localhost/"]);
    }

    #[test]
    fn test_empty_json_containers_are_absent() {
        for body in [json!({}), json!([])] {
            let spec = bare("http://localhost/").method("POST").json(body).build();
            assert_eq!(args_of(&spec), ["-X", "POST", "http://localhost/"]);
        }

        let spec = bare("http://localhost/").method("POST").json(json!(0)).build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "POST",
                "--data-raw",
                "0",
                "-H",
                "Content-Type: application/json",
                "http://localhost/"
            ]
        );
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let spec = bare("http://localhost/")
            .method("POST")
            .header("content-type", "application/vnd.api+json")
            .json(json!([1, 2]))
            .build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "POST",
                "-H",
                "content-type: application/vnd.api+json",
                "--data-raw",
                "[1,2]",
                "http://localhost/",
            ]
        );
    }

    #[test]
    fn test_full_argument_order() {
        let spec = RequestSpec::builder("https://example.com/a")
            .method("put")
            .header("X-Trace", "1")
            .file(FileAttachment::new("files", "main.rs"))
            .file(FileAttachment::new("files", "lib.rs").with_media_type("text/rust"))
            .auth(Credentials::new("u", "p"))
            .proxy("http://proxy:3128")
            .proxy_auth(Credentials::new("pu", "pp"))
            .limit_rate("200k")
            .connect_timeout(5)
            .build();
        assert_eq!(
            args_of(&spec),
            [
                "-X",
                "PUT",
                "-H",
                "X-Trace: 1",
                "-H",
                "Content-Type: multipart/form-data",
                "-F",
                "files=@main.rs",
                "-F",
                "files=@lib.rs;type=text/rust",
                "--user",
                "u:p",
                "-x",
                "http://proxy:3128",
                "--proxy-user",
                "pu:pp",
                "-k",
                "-L",
                "--limit-rate",
                "200k",
                "--connect-timeout",
                "5",
                "https://example.com/a",
            ]
        );
    }

    #[test]
    fn test_proxy_auth_without_proxy_is_ignored() {
        let spec = bare("http://localhost/")
            .proxy_auth(Credentials::new("pu", "pp"))
            .build();
        assert_eq!(args_of(&spec), ["-X", "GET", "http://localhost/"]);
    }

    #[test]
    fn test_input_spec_is_untouched() {
        let spec = bare("http://localhost/")
            .query("a", "1")
            .form("name", "D")
            .build();
        let before = spec.clone();
        build_args(&spec).unwrap();
        assert_eq!(spec, before);
    }

    #[test]
    fn test_command_line_quotes_values() {
        let spec = bare("http://localhost/")
            .method("POST")
            .header("X-Name", "it's")
            .form("a", "b c")
            .build();
        assert_eq!(
            build_args(&spec).unwrap().command_line("curl"),
            "curl -X POST -H 'X-Name: it'\\''s' -d 'a=b+c' -H 'Content-Type: application/x-www-form-urlencoded' http://localhost/"
        );
    }
}
