//! Prelude module for convenient imports.
//!
//! ```ignore
//! use clasp::prelude::*;
//! ```

pub use crate::{
    ClientHandle, ClientProperties, Endpoint, Error, HttpClient, HyperClient, LoadBalancedClient,
    LoadBalancedClientCache, LogLevel, Method, NamedScope, Request, RequestOptions, Response,
    Result, ScopeRegistry, ServerInstance, ServiceClient, ServiceClientFactory, ServiceDescriptor,
    ServiceProperties, StaticLoadBalancerRegistry, Target,
};
pub use serde::{Deserialize, Serialize};
