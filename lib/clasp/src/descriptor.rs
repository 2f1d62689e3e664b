//! Declarative description of a remote service client.

use clasp_core::{Error, Result};
use url::Url;

use crate::target::ensure_scheme;

/// Everything the factory needs to know about one client before any
/// configuration resolution happens.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    service_name: String,
    context_id: String,
    url: Option<String>,
    path: String,
    decode_not_found: bool,
    inherit_parent_scope: bool,
    fallback: Option<String>,
    fallback_factory: Option<String>,
}

impl ServiceDescriptor {
    /// Create a descriptor for a named service. The context id defaults to
    /// the service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            context_id: service_name.clone(),
            service_name,
            url: None,
            path: String::new(),
            decode_not_found: false,
            inherit_parent_scope: true,
            fallback: None,
            fallback_factory: None,
        }
    }

    /// Use a context id distinct from the service name.
    #[must_use]
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = context_id.into();
        self
    }

    /// Pin the client to an explicit URL, bypassing load balancing.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Path prefix appended to the resolved base URL.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Treat 404 responses as decodable results instead of errors.
    #[must_use]
    pub const fn with_decode_not_found(mut self, decode: bool) -> Self {
        self.decode_not_found = decode;
        self
    }

    /// When `false`, only the client's own named scope is consulted during
    /// resolution and root-scope capabilities are ignored.
    #[must_use]
    pub const fn with_inherit_parent_scope(mut self, inherit: bool) -> Self {
        self.inherit_parent_scope = inherit;
        self
    }

    /// Name of a registered fallback handler.
    #[must_use]
    pub fn with_fallback(mut self, name: impl Into<String>) -> Self {
        self.fallback = Some(name.into());
        self
    }

    /// Name of a registered fallback factory.
    #[must_use]
    pub fn with_fallback_factory(mut self, name: impl Into<String>) -> Self {
        self.fallback_factory = Some(name.into());
        self
    }

    /// The logical service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The configuration context id.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// The explicit URL, if pinned.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The raw path prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether 404 responses decode as results.
    #[must_use]
    pub const fn decode_not_found(&self) -> bool {
        self.decode_not_found
    }

    /// Whether root-scope capabilities participate in resolution.
    #[must_use]
    pub const fn inherit_parent_scope(&self) -> bool {
        self.inherit_parent_scope
    }

    /// The fallback handler name, if any.
    #[must_use]
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// The fallback factory name, if any.
    #[must_use]
    pub fn fallback_factory(&self) -> Option<&str> {
        self.fallback_factory.as_deref()
    }

    /// The path prefix, normalized: trimmed, a single leading slash, no
    /// trailing slash, empty when blank.
    #[must_use]
    pub fn clean_path(&self) -> String {
        let mut path = self.path.trim().to_string();
        if path.is_empty() {
            return path;
        }
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        while path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        if path == "/" {
            return String::new();
        }
        path
    }

    /// Check structural validity before any resolution work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the service name or context id
    /// is blank, or when an explicit URL does not parse.
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::configuration("service name must not be blank"));
        }
        if self.context_id.trim().is_empty() {
            return Err(Error::configuration(format!(
                "context id must not be blank for service '{}'",
                self.service_name
            )));
        }
        if let Some(url) = &self.url {
            let normalized = ensure_scheme(url);
            Url::parse(&normalized).map_err(|err| {
                Error::configuration(format!(
                    "invalid url '{url}' for service '{}': {err}",
                    self.service_name
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn context_id_defaults_to_service_name() {
        let descriptor = ServiceDescriptor::new("orders");
        check!(descriptor.context_id() == "orders");
    }

    #[test]
    fn clean_path_normalizes() {
        let cases = [
            ("", ""),
            ("  ", ""),
            ("/", ""),
            ("v1", "/v1"),
            ("/v1/", "/v1"),
            (" /v1/api/ ", "/v1/api"),
        ];
        for (input, expected) in cases {
            let descriptor = ServiceDescriptor::new("orders").with_path(input);
            check!(descriptor.clean_path() == expected, "input {input:?}");
        }
    }

    #[test]
    fn blank_service_name_rejected() {
        let descriptor = ServiceDescriptor::new("  ");
        check!(descriptor.validate().is_err());
    }

    #[test]
    fn blank_context_id_rejected() {
        let descriptor = ServiceDescriptor::new("orders").with_context_id(" ");
        check!(descriptor.validate().is_err());
    }

    #[test]
    fn explicit_url_without_scheme_is_valid() {
        let descriptor = ServiceDescriptor::new("orders").with_url("orders.internal:8080");
        check!(descriptor.validate().is_ok());
    }

    #[test]
    fn unparseable_url_rejected() {
        let descriptor = ServiceDescriptor::new("orders").with_url("http://exa mple");
        check!(descriptor.validate().is_err());
    }
}
