//! Deterministic per-service configuration resolution.
//!
//! A client's effective configuration is merged from up to four sources:
//! built-in defaults, capabilities declared in the scope registry (root
//! scope then named scope), the `default` property block, and the
//! per-context property block. The `default_to_properties` flag decides
//! whether property sources or declared sources are applied last; whatever
//! is applied last wins field-by-field. An unset field never overrides a
//! set one.

use std::sync::Arc;
use std::time::Duration;

use clasp_core::{
    DefaultContract, ExceptionPropagationPolicy, HeaderInterceptor, JsonDecoder, JsonEncoder,
    LogLevel, NeverRetry, QueryInterceptor, RequestOptions, SharedContract, SharedDecoder,
    SharedEncoder, SharedErrorDecoder, SharedErrorDecoderFactory, SharedInterceptor,
    SharedQueryMapEncoder, SharedRetry, SortedQueryMapEncoder, StatusErrorDecoder,
    dedupe_interceptors, sort_interceptors,
};

use crate::descriptor::ServiceDescriptor;
use crate::properties::{ClientProperties, ServiceProperties};
use crate::scope::ScopeRegistry;

/// The fully merged configuration for one client. Built once per client at
/// construction time; never re-resolved afterwards.
#[derive(Clone)]
pub struct ResolvedClientSpec {
    /// Per-call log level.
    pub log_level: LogLevel,
    /// Retry policy.
    pub retry: SharedRetry,
    /// Decoder for non-2xx responses.
    pub error_decoder: SharedErrorDecoder,
    /// Connect/read timeouts.
    pub options: RequestOptions,
    /// Interceptors, deduplicated and in application order.
    pub interceptors: Vec<SharedInterceptor>,
    /// Query-map flattening strategy.
    pub query_map_encoder: SharedQueryMapEncoder,
    /// Whether 404 responses decode as results.
    pub decode_not_found: bool,
    /// How retried-call errors surface.
    pub propagation_policy: ExceptionPropagationPolicy,
    /// Request body encoder.
    pub encoder: SharedEncoder,
    /// Response decoder.
    pub decoder: SharedDecoder,
    /// Endpoint-to-template contract.
    pub contract: SharedContract,
}

impl std::fmt::Debug for ResolvedClientSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedClientSpec")
            .field("log_level", &self.log_level)
            .field("options", &self.options)
            .field("interceptors", &self.interceptors.len())
            .field("decode_not_found", &self.decode_not_found)
            .field("propagation_policy", &self.propagation_policy)
            .finish_non_exhaustive()
    }
}

/// Merges the four configuration sources for one descriptor.
pub struct ConfigResolver<'a> {
    registry: &'a ScopeRegistry,
    properties: &'a ClientProperties,
}

impl<'a> ConfigResolver<'a> {
    /// Create a resolver over a scope registry and a property set.
    #[must_use]
    pub const fn new(registry: &'a ScopeRegistry, properties: &'a ClientProperties) -> Self {
        Self {
            registry,
            properties,
        }
    }

    /// Resolve the effective configuration for `descriptor`.
    ///
    /// The merge is deterministic: the same registry, properties, and
    /// descriptor always produce the same spec.
    #[must_use]
    pub fn resolve(&self, descriptor: &ServiceDescriptor) -> ResolvedClientSpec {
        let context_id = descriptor.context_id();

        let mut spec = ResolvedClientSpec {
            log_level: LogLevel::None,
            retry: Arc::new(NeverRetry),
            error_decoder: Arc::new(StatusErrorDecoder),
            options: RequestOptions::default(),
            interceptors: Vec::new(),
            query_map_encoder: Arc::new(SortedQueryMapEncoder),
            decode_not_found: descriptor.decode_not_found(),
            propagation_policy: ExceptionPropagationPolicy::None,
            encoder: Arc::new(JsonEncoder),
            decoder: Arc::new(JsonDecoder),
            contract: Arc::new(DefaultContract),
        };

        if descriptor.inherit_parent_scope() {
            if self.properties.default_to_properties {
                self.apply_declared(&mut spec, descriptor);
                if let Some(defaults) = self.properties.default_properties() {
                    Self::apply_properties(&mut spec, defaults);
                }
                if let Some(own) = self.properties.get(context_id) {
                    Self::apply_properties(&mut spec, own);
                }
            } else {
                if let Some(defaults) = self.properties.default_properties() {
                    Self::apply_properties(&mut spec, defaults);
                }
                if let Some(own) = self.properties.get(context_id) {
                    Self::apply_properties(&mut spec, own);
                }
                self.apply_declared(&mut spec, descriptor);
            }
        } else {
            // Opting out of ancestor inheritance also opts out of the
            // property sources; only the client's own scope applies.
            self.apply_declared(&mut spec, descriptor);
        }

        dedupe_interceptors(&mut spec.interceptors);
        sort_interceptors(&mut spec.interceptors);
        spec
    }

    fn apply_declared(&self, spec: &mut ResolvedClientSpec, descriptor: &ServiceDescriptor) {
        let context_id = descriptor.context_id();
        let inherit = descriptor.inherit_parent_scope();

        if let Some(level) = self.lookup::<LogLevel>(context_id, inherit) {
            spec.log_level = level;
        }
        if let Some(retry) = self.lookup::<SharedRetry>(context_id, inherit) {
            spec.retry = retry;
        }
        if let Some(decoder) = self.lookup::<SharedErrorDecoder>(context_id, inherit) {
            spec.error_decoder = decoder;
        } else if let Some(factory) = self.lookup::<SharedErrorDecoderFactory>(context_id, inherit)
        {
            spec.error_decoder = factory.create(descriptor.service_name());
        }
        if let Some(options) = self.lookup::<RequestOptions>(context_id, inherit) {
            spec.options = options;
        }
        let declared = if inherit {
            self.registry.get_instances::<SharedInterceptor>(context_id)
        } else {
            self.registry
                .get_instances_without_ancestors::<SharedInterceptor>(context_id)
        };
        spec.interceptors.extend(declared.into_values());
        if let Some(encoder) = self.lookup::<SharedQueryMapEncoder>(context_id, inherit) {
            spec.query_map_encoder = encoder;
        }
        if let Some(policy) = self.lookup::<ExceptionPropagationPolicy>(context_id, inherit) {
            spec.propagation_policy = policy;
        }
        if let Some(encoder) = self.lookup::<SharedEncoder>(context_id, inherit) {
            spec.encoder = encoder;
        }
        if let Some(decoder) = self.lookup::<SharedDecoder>(context_id, inherit) {
            spec.decoder = decoder;
        }
        if let Some(contract) = self.lookup::<SharedContract>(context_id, inherit) {
            spec.contract = contract;
        }
    }

    fn lookup<T>(&self, context_id: &str, inherit: bool) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if inherit {
            self.registry.get_instance::<T>(context_id)
        } else {
            self.registry.get_instance_without_ancestors::<T>(context_id)
        }
    }

    fn apply_properties(spec: &mut ResolvedClientSpec, properties: &ServiceProperties) {
        if let Some(level) = properties.logger_level {
            spec.log_level = level;
        }
        spec.options = merge_timeouts(
            spec.options,
            properties.connect_timeout,
            properties.read_timeout,
        );
        if let Some(retry) = &properties.retry {
            spec.retry = Arc::clone(retry);
        }
        if let Some(decoder) = &properties.error_decoder {
            spec.error_decoder = Arc::clone(decoder);
        }
        spec.interceptors
            .extend(properties.request_interceptors.iter().cloned());
        if let Some(decode) = properties.decode_not_found {
            spec.decode_not_found = decode;
        }
        if let Some(headers) = &properties.default_request_headers {
            let interceptor: SharedInterceptor = Arc::new(HeaderInterceptor::new(
                headers.iter().map(|(k, v)| (k.clone(), v.clone())),
            ));
            spec.interceptors.push(interceptor);
        }
        if let Some(params) = &properties.default_query_parameters {
            let interceptor: SharedInterceptor = Arc::new(QueryInterceptor::new(
                params.iter().map(|(k, v)| (k.clone(), v.clone())),
            ));
            spec.interceptors.push(interceptor);
        }
        if let Some(policy) = properties.exception_propagation_policy {
            spec.propagation_policy = policy;
        }
        if let Some(encoder) = &properties.encoder {
            spec.encoder = Arc::clone(encoder);
        }
        if let Some(decoder) = &properties.decoder {
            spec.decoder = Arc::clone(decoder);
        }
        if let Some(contract) = &properties.contract {
            spec.contract = Arc::clone(contract);
        }
        if let Some(encoder) = &properties.query_map_encoder {
            spec.query_map_encoder = Arc::clone(encoder);
        }
    }
}

/// Build [`RequestOptions`] from optional millisecond overrides on top of an
/// existing base.
#[must_use]
pub fn merge_timeouts(
    base: RequestOptions,
    connect_millis: Option<u64>,
    read_millis: Option<u64>,
) -> RequestOptions {
    RequestOptions::new(
        connect_millis.map_or(base.connect_timeout, Duration::from_millis),
        read_millis.map_or(base.read_timeout, Duration::from_millis),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert2::check;
    use clasp_core::{FixedBackoff, RequestTemplate};

    use super::*;

    fn default_spec(registry: &ScopeRegistry, properties: &ClientProperties) -> ResolvedClientSpec {
        ConfigResolver::new(registry, properties).resolve(&ServiceDescriptor::new("orders"))
    }

    #[test]
    fn defaults_without_any_source() {
        let registry = ScopeRegistry::new();
        let properties = ClientProperties::new();
        let spec = default_spec(&registry, &properties);

        check!(spec.log_level == LogLevel::None);
        check!(spec.options == RequestOptions::default());
        check!(spec.interceptors.is_empty());
        check!(!spec.decode_not_found);
        check!(spec.propagation_policy == ExceptionPropagationPolicy::None);
    }

    #[test]
    fn properties_win_when_flag_true() {
        let mut registry = ScopeRegistry::new();
        registry.scope_mut("orders").register(
            "options",
            RequestOptions::new(Duration::from_secs(1), Duration::from_secs(1)),
        );

        let properties = ClientProperties::new().with_config(
            "orders",
            ServiceProperties::new().with_read_timeout(Duration::from_millis(500)),
        );

        let spec = default_spec(&registry, &properties);
        check!(spec.options.read_timeout == Duration::from_millis(500));
        // Unset property fields never erase declared values.
        check!(spec.options.connect_timeout == Duration::from_secs(1));
    }

    #[test]
    fn declared_wins_when_flag_false() {
        let mut registry = ScopeRegistry::new();
        registry.scope_mut("orders").register(
            "options",
            RequestOptions::new(Duration::from_secs(1), Duration::from_secs(1)),
        );

        let properties = ClientProperties::new()
            .with_default_to_properties(false)
            .with_config(
                "orders",
                ServiceProperties::new().with_read_timeout(Duration::from_millis(500)),
            );

        let spec = default_spec(&registry, &properties);
        check!(spec.options.read_timeout == Duration::from_secs(1));
    }

    #[test]
    fn context_properties_override_default_block() {
        let registry = ScopeRegistry::new();
        let properties = ClientProperties::new()
            .with_config(
                "default",
                ServiceProperties::new()
                    .with_logger_level(LogLevel::Basic)
                    .with_connect_timeout(Duration::from_secs(5)),
            )
            .with_config(
                "orders",
                ServiceProperties::new().with_logger_level(LogLevel::Full),
            );

        let spec = default_spec(&registry, &properties);
        check!(spec.log_level == LogLevel::Full);
        check!(spec.options.connect_timeout == Duration::from_secs(5));
    }

    #[test]
    fn interceptors_union_across_sources() {
        struct Noop;
        impl clasp_core::RequestInterceptor for Noop {
            fn apply(&self, _template: &mut RequestTemplate) {}
        }

        let declared: SharedInterceptor = Arc::new(Noop);
        let from_props: SharedInterceptor = Arc::new(Noop);

        let mut registry = ScopeRegistry::new();
        registry
            .scope_mut("orders")
            .register("declared", Arc::clone(&declared));

        let properties = ClientProperties::new().with_config(
            "orders",
            ServiceProperties::new().with_interceptor(Arc::clone(&from_props)),
        );

        let spec = default_spec(&registry, &properties);
        check!(spec.interceptors.len() == 2);
    }

    #[test]
    fn duplicate_interceptor_handles_collapse() {
        struct Noop;
        impl clasp_core::RequestInterceptor for Noop {
            fn apply(&self, _template: &mut RequestTemplate) {}
        }

        let shared: SharedInterceptor = Arc::new(Noop);

        let mut registry = ScopeRegistry::new();
        registry
            .scope_mut("orders")
            .register("declared", Arc::clone(&shared));

        let properties = ClientProperties::new().with_config(
            "orders",
            ServiceProperties::new().with_interceptor(Arc::clone(&shared)),
        );

        let spec = default_spec(&registry, &properties);
        check!(spec.interceptors.len() == 1);
    }

    #[test]
    fn opting_out_of_inheritance_ignores_root_and_properties() {
        let mut registry = ScopeRegistry::new();
        registry.root_mut().register("level", LogLevel::Full);

        let properties = ClientProperties::new().with_config(
            "orders",
            ServiceProperties::new().with_logger_level(LogLevel::Basic),
        );

        let descriptor = ServiceDescriptor::new("orders").with_inherit_parent_scope(false);
        let spec = ConfigResolver::new(&registry, &properties).resolve(&descriptor);
        check!(spec.log_level == LogLevel::None);
    }

    #[test]
    fn default_headers_become_interceptors() {
        let registry = ScopeRegistry::new();
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("X-Env".to_string(), "prod".to_string());
        let properties = ClientProperties::new().with_config(
            "orders",
            ServiceProperties::new().with_default_headers(headers),
        );

        let spec = default_spec(&registry, &properties);
        let mut template = RequestTemplate::new(clasp_core::Method::Get, "/ping");
        for interceptor in &spec.interceptors {
            interceptor.apply(&mut template);
        }
        check!(template.headers().contains(&("X-Env".to_string(), "prod".to_string())));
    }

    struct TaggedErrorDecoder(&'static str);
    impl clasp_core::ErrorDecoder for TaggedErrorDecoder {
        fn decode(
            &self,
            _target: &str,
            response: &clasp_core::Response<bytes::Bytes>,
        ) -> clasp_core::Error {
            clasp_core::Error::http(response.status(), self.0)
        }
    }

    struct TaggedErrorDecoderFactory(&'static str);
    impl clasp_core::ErrorDecoderFactory for TaggedErrorDecoderFactory {
        fn create(&self, _service_name: &str) -> SharedErrorDecoder {
            Arc::new(TaggedErrorDecoder(self.0))
        }
    }

    fn decoded_message(spec: &ResolvedClientSpec) -> String {
        let response = clasp_core::Response::new(
            500,
            std::collections::HashMap::new(),
            bytes::Bytes::new(),
        );
        spec.error_decoder.decode("orders", &response).to_string()
    }

    #[test]
    fn error_decoder_factory_used_when_no_instance() {
        let mut registry = ScopeRegistry::new();
        registry
            .scope_mut("orders")
            .register::<SharedErrorDecoderFactory>(
                "factory",
                Arc::new(TaggedErrorDecoderFactory("from-factory")),
            );

        let spec = default_spec(&registry, &ClientProperties::new());
        check!(decoded_message(&spec).contains("from-factory"));
    }

    #[test]
    fn error_decoder_instance_beats_factory() {
        let mut registry = ScopeRegistry::new();
        registry.scope_mut("orders").register::<SharedErrorDecoder>(
            "instance",
            Arc::new(TaggedErrorDecoder("from-instance")),
        );
        registry
            .scope_mut("orders")
            .register::<SharedErrorDecoderFactory>(
                "factory",
                Arc::new(TaggedErrorDecoderFactory("from-factory")),
            );

        let spec = default_spec(&registry, &ClientProperties::new());
        check!(decoded_message(&spec).contains("from-instance"));
    }

    #[test]
    fn declared_encoder_wins_when_flag_false() {
        let mut registry = ScopeRegistry::new();
        let declared: SharedEncoder = Arc::new(clasp_core::FormEncoder);
        registry
            .scope_mut("orders")
            .register("form", Arc::clone(&declared));

        let properties = ClientProperties::new()
            .with_default_to_properties(false)
            .with_config(
                "orders",
                ServiceProperties::new().with_encoder(Arc::new(JsonEncoder)),
            );

        let spec = default_spec(&registry, &properties);
        check!(Arc::ptr_eq(&spec.encoder, &declared));
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut registry = ScopeRegistry::new();
        registry
            .scope_mut("orders")
            .register::<SharedRetry>("zeta", Arc::new(FixedBackoff::new(3, Duration::from_millis(10))));
        registry
            .scope_mut("orders")
            .register::<SharedRetry>("alpha", Arc::new(NeverRetry));
        let properties = ClientProperties::new();

        let first = default_spec(&registry, &properties);
        let second = default_spec(&registry, &properties);
        check!(Arc::ptr_eq(&first.retry, &second.retry));
    }
}
