//! HTTP transport implementation using hyper-util.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};

use clasp_core::{Error, HttpClient, Request, RequestOptions, Response, Result};

use crate::connector::https_connector;

/// The default [`HttpClient`]: a pooled hyper client with rustls TLS.
///
/// Connect timeouts are enforced by the connector, read timeouts per call
/// from the [`RequestOptions`] passed to [`execute`](HttpClient::execute).
#[derive(Clone)]
pub struct HyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HyperClient {
    /// Create a client with the default connect timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(RequestOptions::default().connect_timeout)
    }

    /// Create a client with an explicit connect timeout.
    #[must_use]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let connector = https_connector(connect_timeout);
        let inner = Client::builder(TokioExecutor::new()).build(connector);
        Self { inner }
    }

    fn build_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HyperClient")
    }
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn execute(
        &self,
        request: Request<Bytes>,
        options: &RequestOptions,
    ) -> Result<Response<Bytes>> {
        let hyper_request = Self::build_hyper_request(request)?;

        // The read timeout bounds the whole exchange, body included. A
        // response whose body stalls mid-stream must not hang the caller.
        tokio::time::timeout(options.read_timeout, async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let response_headers = Self::extract_headers(response.headers());

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok(Response::new(status, response_headers, body))
        })
        .await
        .map_err(|_| Error::Timeout)?
    }
}
