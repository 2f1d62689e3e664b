//! Externally supplied per-service properties.
//!
//! Properties are the operator-facing configuration source: plain data that
//! can be deserialized from the host's configuration file, keyed by context
//! id with a reserved `default` key for the global fallback. Capability
//! handles (retry policies, codecs, interceptors) cannot come from a file,
//! so they are builder-set slots skipped by serde.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use clasp_core::{
    ExceptionPropagationPolicy, LogLevel, SharedContract, SharedDecoder, SharedEncoder,
    SharedErrorDecoder, SharedInterceptor, SharedQueryMapEncoder, SharedRetry,
};

/// The reserved key of the global-fallback property block.
pub const DEFAULT_CONFIG_KEY: &str = "default";

/// Property-supplied configuration for one service (or for the `default`
/// block). Every field is optional: absence means "not specified" and never
/// erases a value resolved from another source.
#[derive(Clone, Default, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServiceProperties {
    /// Per-call log level.
    pub logger_level: Option<LogLevel>,
    /// Connect timeout in milliseconds.
    pub connect_timeout: Option<u64>,
    /// Read timeout in milliseconds.
    pub read_timeout: Option<u64>,
    /// Treat 404 responses as decodable results instead of errors.
    pub decode_not_found: Option<bool>,
    /// Headers appended to every request.
    pub default_request_headers: Option<BTreeMap<String, String>>,
    /// Query parameters appended to every request.
    pub default_query_parameters: Option<BTreeMap<String, String>>,
    /// How retried-call errors surface.
    pub exception_propagation_policy: Option<ExceptionPropagationPolicy>,

    /// Retry policy handle.
    #[serde(skip)]
    pub retry: Option<SharedRetry>,
    /// Error decoder handle.
    #[serde(skip)]
    pub error_decoder: Option<SharedErrorDecoder>,
    /// Interceptors contributed by this source (appended, never replacing).
    #[serde(skip)]
    pub request_interceptors: Vec<SharedInterceptor>,
    /// Encoder handle.
    #[serde(skip)]
    pub encoder: Option<SharedEncoder>,
    /// Decoder handle.
    #[serde(skip)]
    pub decoder: Option<SharedDecoder>,
    /// Contract handle.
    #[serde(skip)]
    pub contract: Option<SharedContract>,
    /// Query-map encoder handle.
    #[serde(skip)]
    pub query_map_encoder: Option<SharedQueryMapEncoder>,
}

impl ServiceProperties {
    /// Create an empty property block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect timeout as a [`Duration`], if specified.
    #[must_use]
    pub fn connect_timeout_duration(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_millis)
    }

    /// Read timeout as a [`Duration`], if specified.
    #[must_use]
    pub fn read_timeout_duration(&self) -> Option<Duration> {
        self.read_timeout.map(Duration::from_millis)
    }

    /// Set the log level.
    #[must_use]
    pub const fn with_logger_level(mut self, level: LogLevel) -> Self {
        self.logger_level = Some(level);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the retry policy handle.
    #[must_use]
    pub fn with_retry(mut self, retry: SharedRetry) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the error decoder handle.
    #[must_use]
    pub fn with_error_decoder(mut self, decoder: SharedErrorDecoder) -> Self {
        self.error_decoder = Some(decoder);
        self
    }

    /// Append an interceptor contributed by this source.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: SharedInterceptor) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Set default request headers.
    #[must_use]
    pub fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_request_headers = Some(headers);
        self
    }

    /// Set default query parameters.
    #[must_use]
    pub fn with_default_query_parameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.default_query_parameters = Some(params);
        self
    }

    /// Set the 404-decoding toggle.
    #[must_use]
    pub const fn with_decode_not_found(mut self, decode: bool) -> Self {
        self.decode_not_found = Some(decode);
        self
    }

    /// Set the encoder handle.
    #[must_use]
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Set the decoder handle.
    #[must_use]
    pub fn with_decoder(mut self, decoder: SharedDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set the contract handle.
    #[must_use]
    pub fn with_contract(mut self, contract: SharedContract) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Set the exception propagation policy.
    #[must_use]
    pub const fn with_propagation_policy(mut self, policy: ExceptionPropagationPolicy) -> Self {
        self.exception_propagation_policy = Some(policy);
        self
    }
}

impl std::fmt::Debug for ServiceProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProperties")
            .field("logger_level", &self.logger_level)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("decode_not_found", &self.decode_not_found)
            .field("default_request_headers", &self.default_request_headers)
            .field("default_query_parameters", &self.default_query_parameters)
            .field(
                "exception_propagation_policy",
                &self.exception_propagation_policy,
            )
            .field("interceptors", &self.request_interceptors.len())
            .finish_non_exhaustive()
    }
}

/// The full property set: per-context blocks plus the precedence flag.
#[derive(Clone, serde::Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientProperties {
    /// When `true` (the default), properties are applied after declared
    /// configuration and therefore win field-by-field. When `false`,
    /// declared configuration is applied last and wins.
    pub default_to_properties: bool,
    /// Key of the global-fallback block, normally `default`.
    pub default_config: String,
    /// Property blocks keyed by context id.
    pub config: HashMap<String, ServiceProperties>,
}

impl Default for ClientProperties {
    fn default() -> Self {
        Self {
            default_to_properties: true,
            default_config: DEFAULT_CONFIG_KEY.to_string(),
            config: HashMap::new(),
        }
    }
}

impl ClientProperties {
    /// Create an empty property set with default precedence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the precedence flag.
    #[must_use]
    pub const fn with_default_to_properties(mut self, flag: bool) -> Self {
        self.default_to_properties = flag;
        self
    }

    /// Insert a property block for a context id.
    #[must_use]
    pub fn with_config(mut self, context_id: impl Into<String>, properties: ServiceProperties) -> Self {
        self.config.insert(context_id.into(), properties);
        self
    }

    /// The block for a context id, if present.
    #[must_use]
    pub fn get(&self, context_id: &str) -> Option<&ServiceProperties> {
        self.config.get(context_id)
    }

    /// The global-fallback block, if present.
    #[must_use]
    pub fn default_properties(&self) -> Option<&ServiceProperties> {
        self.config.get(&self.default_config)
    }
}

impl std::fmt::Debug for ClientProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientProperties")
            .field("default_to_properties", &self.default_to_properties)
            .field("default_config", &self.default_config)
            .field("contexts", &self.config.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "default-to-properties": false,
            "config": {
                "default": { "connect-timeout": 5000 },
                "orders": {
                    "logger-level": "basic",
                    "read-timeout": 500,
                    "decode-not-found": true,
                    "default-request-headers": { "X-Env": "prod" }
                }
            }
        }"#;

        let properties: ClientProperties = serde_json::from_str(json).expect("deserialize");
        assert!(!properties.default_to_properties);
        assert_eq!(properties.default_config, "default");

        let orders = properties.get("orders").expect("orders block");
        assert_eq!(orders.logger_level, Some(LogLevel::Basic));
        assert_eq!(orders.read_timeout_duration(), Some(Duration::from_millis(500)));
        assert_eq!(orders.decode_not_found, Some(true));

        let defaults = properties.default_properties().expect("default block");
        assert_eq!(
            defaults.connect_timeout_duration(),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn missing_fields_stay_unset() {
        let properties: ServiceProperties = serde_json::from_str("{}").expect("deserialize");
        assert!(properties.logger_level.is_none());
        assert!(properties.connect_timeout.is_none());
        assert!(properties.default_request_headers.is_none());
        assert!(properties.request_interceptors.is_empty());
    }

    #[test]
    fn builder_sets_capability_slots() {
        let retry: SharedRetry = std::sync::Arc::new(clasp_core::NeverRetry);
        let properties = ServiceProperties::new()
            .with_retry(std::sync::Arc::clone(&retry))
            .with_connect_timeout(Duration::from_secs(2));

        assert!(properties.retry.is_some());
        assert_eq!(properties.connect_timeout, Some(2000));
    }

    #[test]
    fn default_precedence_is_properties_win() {
        assert!(ClientProperties::default().default_to_properties);
    }
}
