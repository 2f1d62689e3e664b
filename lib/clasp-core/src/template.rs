//! Request templates.
//!
//! A [`RequestTemplate`] is the mutable, target-relative form of a request:
//! interceptors rewrite it, the encoder attaches a body to it, and the
//! resolved client finally binds it to a target URL to produce a
//! [`Request`].

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{ContentType, Error, Method, Request, Result};

/// A path pattern with `{name}` placeholders, e.g. `/orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every `{name}` placeholder from `values`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a placeholder has no value or a
    /// brace is unbalanced.
    pub fn expand(&self, values: &BTreeMap<String, String>) -> Result<String> {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find('{') {
            let (before, after) = rest.split_at(start);
            out.push_str(before);
            let Some(end) = after.find('}') else {
                return Err(Error::invalid_request(format!(
                    "unbalanced '{{' in path template '{}'",
                    self.0
                )));
            };
            let name = after.get(1..end).unwrap_or_default();
            let Some(value) = values.get(name) else {
                return Err(Error::invalid_request(format!(
                    "missing value for path parameter '{name}' in template '{}'",
                    self.0
                )));
            };
            out.push_str(value);
            rest = after.get(end + 1..).unwrap_or_default();
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A target-relative request under construction.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    queries: Vec<(String, String)>,
    query_map: BTreeMap<String, String>,
    body: Option<(Bytes, ContentType)>,
}

impl RequestTemplate {
    /// Create a template for a resolved path (placeholders already expanded).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            queries: Vec::new(),
            query_map: BTreeMap::new(),
            body: None,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target-relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers appended so far, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Query parameters appended so far, in insertion order.
    #[must_use]
    pub fn queries(&self) -> &[(String, String)] {
        &self.queries
    }

    /// Append a header. Interceptors call this through `&mut`.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter.
    pub fn query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.queries.push((name.into(), value.into()));
        self
    }

    /// Set the raw query map, to be flattened by the resolved query-map
    /// encoder before the template is bound to a target.
    pub fn query_map(&mut self, map: BTreeMap<String, String>) -> &mut Self {
        self.query_map = map;
        self
    }

    /// Take the raw query map out of the template.
    #[must_use]
    pub fn take_query_map(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.query_map)
    }

    /// Attach a body with its content type.
    pub fn body(&mut self, body: Bytes, content_type: ContentType) -> &mut Self {
        self.body = Some((body, content_type));
        self
    }

    /// Builder-style variants for call sites assembling a template inline.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header(name, value);
        self
    }

    /// Builder-style query append.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query(name, value);
        self
    }

    /// Builder-style body attachment.
    #[must_use]
    pub fn with_body(mut self, body: Bytes, content_type: ContentType) -> Self {
        self.body(body, content_type);
        self
    }

    /// Bind the template to a target base URL, producing an executable
    /// request.
    ///
    /// The base is the resolved target URL (e.g. `http://orders/v1`); the
    /// template path is appended to it, then queries, headers, and body are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined URL does not parse.
    pub fn resolve(&self, base_url: &str) -> Result<Request<Bytes>> {
        let full = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        let url = url::Url::parse(&full)?;

        let mut builder = Request::builder(self.method, url);
        for (name, value) in &self.queries {
            builder = builder.query(name, value);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.clone(), value.clone());
        }
        if let Some((body, content_type)) = &self.body {
            builder = builder
                .header("Content-Type", content_type.as_str())
                .body(body.clone());
        }
        Ok(builder.build())
    }
}
