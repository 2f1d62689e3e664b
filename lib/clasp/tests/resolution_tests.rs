//! Precedence and determinism of per-service configuration resolution.

use std::sync::Arc;
use std::time::Duration;

use clasp::{
    ClientProperties, ConfigResolver, Endpoint, RequestOptions, ScopeRegistry, ServiceDescriptor,
    ServiceProperties, SharedInterceptor,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn properties_override_declared_timeouts_by_default() {
    let mut registry = ScopeRegistry::new();
    registry.scope_mut("orders").register(
        "options",
        RequestOptions::new(Duration::from_secs(10), Duration::from_millis(1000)),
    );

    let properties = ClientProperties::new().with_config(
        "orders",
        ServiceProperties::new().with_read_timeout(Duration::from_millis(500)),
    );

    let spec =
        ConfigResolver::new(&registry, &properties).resolve(&ServiceDescriptor::new("orders"));
    assert_eq!(spec.options.read_timeout, Duration::from_millis(500));
}

#[test]
fn declared_timeouts_win_when_flag_is_off() {
    let mut registry = ScopeRegistry::new();
    registry.scope_mut("orders").register(
        "options",
        RequestOptions::new(Duration::from_secs(10), Duration::from_millis(1000)),
    );

    let properties = ClientProperties::new()
        .with_default_to_properties(false)
        .with_config(
            "orders",
            ServiceProperties::new().with_read_timeout(Duration::from_millis(500)),
        );

    let spec =
        ConfigResolver::new(&registry, &properties).resolve(&ServiceDescriptor::new("orders"));
    assert_eq!(spec.options.read_timeout, Duration::from_millis(1000));
}

#[test]
fn resolution_is_stable_across_repeated_runs() {
    let mut registry = ScopeRegistry::new();
    registry.scope_mut("orders").register(
        "options",
        RequestOptions::new(Duration::from_secs(2), Duration::from_secs(3)),
    );
    let properties = ClientProperties::new().with_config(
        "orders",
        ServiceProperties::new().with_connect_timeout(Duration::from_secs(1)),
    );

    let resolver = ConfigResolver::new(&registry, &properties);
    let descriptor = ServiceDescriptor::new("orders");
    let first = resolver.resolve(&descriptor);
    let second = resolver.resolve(&descriptor);

    assert_eq!(first.options, second.options);
    assert_eq!(first.interceptors.len(), second.interceptors.len());
    assert_eq!(first.log_level, second.log_level);
}

#[tokio::test]
async fn declared_and_property_interceptors_both_apply() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .and(header("X-Declared", "yes"))
        .and(query_param("tenant", "acme"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut registry = ScopeRegistry::new();
    registry.scope_mut("orders").register::<SharedInterceptor>(
        "declared-header",
        Arc::new(clasp::HeaderInterceptor::new([(
            "X-Declared".to_string(),
            "yes".to_string(),
        )])),
    );

    let mut params = std::collections::BTreeMap::new();
    params.insert("tenant".to_string(), "acme".to_string());
    let properties = ClientProperties::new().with_config(
        "orders",
        ServiceProperties::new().with_default_query_parameters(params),
    );

    let factory = clasp::ServiceClientFactory::new(Arc::new(registry), properties);
    let descriptor = ServiceDescriptor::new("orders").with_url(server.uri());
    let client = factory.build(&descriptor).expect("client");

    let response = client.call(&Endpoint::get("/v1/ping")).await.expect("response");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn root_scope_capabilities_apply_to_every_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .and(header("X-Global", "on"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut registry = ScopeRegistry::new();
    registry.root_mut().register::<SharedInterceptor>(
        "global-header",
        Arc::new(clasp::HeaderInterceptor::new([(
            "X-Global".to_string(),
            "on".to_string(),
        )])),
    );

    let factory = clasp::ServiceClientFactory::new(Arc::new(registry), ClientProperties::new());
    let descriptor = ServiceDescriptor::new("billing").with_url(server.uri());
    let client = factory.build(&descriptor).expect("client");

    let response = client.call(&Endpoint::get("/v1/ping")).await.expect("response");
    assert_eq!(response.status(), 200);
}

#[test]
fn opting_out_of_inheritance_drops_root_capabilities() {
    let mut registry = ScopeRegistry::new();
    registry.root_mut().register(
        "options",
        RequestOptions::new(Duration::from_secs(1), Duration::from_secs(1)),
    );

    let properties = ClientProperties::new();
    let descriptor = ServiceDescriptor::new("orders").with_inherit_parent_scope(false);
    let spec = ConfigResolver::new(&registry, &properties).resolve(&descriptor);
    assert_eq!(spec.options, RequestOptions::default());
}

#[test]
fn context_id_selects_the_property_block() {
    let properties = ClientProperties::new()
        .with_config(
            "orders-v2",
            ServiceProperties::new().with_read_timeout(Duration::from_millis(250)),
        )
        .with_config(
            "orders",
            ServiceProperties::new().with_read_timeout(Duration::from_millis(900)),
        );

    let registry = ScopeRegistry::new();
    let descriptor = ServiceDescriptor::new("orders").with_context_id("orders-v2");
    let spec = ConfigResolver::new(&registry, &properties).resolve(&descriptor);
    assert_eq!(spec.options.read_timeout, Duration::from_millis(250));
}
