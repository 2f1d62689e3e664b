//! Endpoint definitions and the contract capability.
//!
//! An [`Endpoint`] describes one callable operation of a service interface:
//! method, path template, per-call parameters. The resolved [`Contract`]
//! turns it into a [`RequestTemplate`], applying the request-parsing rules
//! of the framework (placeholder expansion, path validation).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Error, Method, PathTemplate, RequestTemplate, Result};

/// One declared operation on a remote service.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    path: PathTemplate,
    path_params: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    queries: Vec<(String, String)>,
    query_map: BTreeMap<String, String>,
}

impl Endpoint {
    /// Create an endpoint from a method and a path template.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: PathTemplate::new(path),
            path_params: BTreeMap::new(),
            headers: Vec::new(),
            queries: Vec::new(),
            query_map: BTreeMap::new(),
        }
    }

    /// GET shorthand.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST shorthand.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// PUT shorthand.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// DELETE shorthand.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Supply a value for a `{name}` placeholder.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path_params.insert(name.into(), value.to_string());
        self
    }

    /// Append a per-call header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a per-call query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.queries.push((name.into(), value.to_string()));
        self
    }

    /// Supply a whole query map, flattened later by the resolved
    /// query-map encoder.
    #[must_use]
    pub fn query_map(mut self, map: BTreeMap<String, String>) -> Self {
        self.query_map = map;
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }
}

/// Capability applying request-parsing rules to an [`Endpoint`].
pub trait Contract: Send + Sync {
    /// Turn the endpoint into a target-relative request template.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint violates the contract's rules.
    fn parse(&self, endpoint: &Endpoint) -> Result<RequestTemplate>;
}

/// Shared handle to a [`Contract`].
pub type SharedContract = Arc<dyn Contract>;

/// Default contract: path must be target-relative (leading `/`), every
/// placeholder must have a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContract;

impl Contract for DefaultContract {
    fn parse(&self, endpoint: &Endpoint) -> Result<RequestTemplate> {
        if !endpoint.path.as_str().starts_with('/') {
            return Err(Error::invalid_request(format!(
                "endpoint path '{}' must start with '/'",
                endpoint.path
            )));
        }
        let path = endpoint.path.expand(&endpoint.path_params)?;

        let mut template = RequestTemplate::new(endpoint.method, path);
        for (name, value) in &endpoint.headers {
            template.header(name.clone(), value.clone());
        }
        for (name, value) in &endpoint.queries {
            template.query(name.clone(), value.clone());
        }
        if !endpoint.query_map.is_empty() {
            template.query_map(endpoint.query_map.clone());
        }
        Ok(template)
    }
}
