//! Core types and capability traits for the clasp declarative HTTP client.
//!
//! This crate provides the vocabulary shared by the clasp resolution engine
//! and by host applications plugging in their own capabilities:
//! - [`Method`], [`Request`], [`Response`] - buffered HTTP types
//! - [`RequestTemplate`], [`PathTemplate`], [`Endpoint`] - pre-binding forms
//! - [`Error`] and [`Result`] - error handling
//! - [`RequestOptions`], [`LogLevel`], [`ExceptionPropagationPolicy`] -
//!   resolved call behavior
//! - Capability traits: [`HttpClient`], [`Encoder`], [`Decoder`],
//!   [`ErrorDecoder`], [`RequestInterceptor`], [`QueryMapEncoder`],
//!   [`Contract`], [`Retry`], [`Fallback`]
//! - The discovery boundary: [`ServerSelector`], [`ServerIntrospector`],
//!   [`LoadBalancerRegistry`]

mod client;
mod codec;
mod contract;
mod discovery;
mod error;
mod interceptor;
mod method;
mod options;
pub mod prelude;
mod request;
mod response;
mod retry;
mod template;

pub use client::{
    Fallback, FallbackFactory, HttpClient, SharedFallback, SharedFallbackFactory, SharedHttpClient,
};
pub use codec::{
    ContentType, Decoder, Encoder, FormEncoder, JsonDecoder, JsonEncoder, QueryMapEncoder,
    SharedDecoder, SharedEncoder, SharedQueryMapEncoder, SortedQueryMapEncoder, from_json, to_form,
    to_json,
};
pub use contract::{Contract, DefaultContract, Endpoint, SharedContract};
pub use discovery::{
    DefaultServerIntrospector, LbClientConfig, LoadBalancerRegistry, RoundRobinSelector,
    ServerInstance, ServerIntrospector, ServerSelector, SharedLoadBalancerRegistry,
    SharedServerIntrospector, SharedServerSelector, StaticLoadBalancerRegistry,
};
pub use error::{
    Error, ErrorDecoder, ErrorDecoderFactory, Result, SharedErrorDecoder,
    SharedErrorDecoderFactory, StatusErrorDecoder,
};
pub use interceptor::{
    HeaderInterceptor, QueryInterceptor, RequestInterceptor, SharedInterceptor,
    dedupe_interceptors, sort_interceptors,
};
pub use method::Method;
pub use options::{ExceptionPropagationPolicy, LogLevel, RequestOptions};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use retry::{FixedBackoff, NeverRetry, Retry, RetryFactory, SharedRetry, SharedRetryFactory};
pub use template::{PathTemplate, RequestTemplate};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
