//! Prelude module for convenient imports.
//!
//! ```ignore
//! use clasp_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Endpoint, Error, ErrorDecoder, HttpClient, LogLevel, Method, Request,
    RequestBuilder, RequestInterceptor, RequestOptions, RequestTemplate, Response, Result,
    from_json, to_form, to_json,
};
