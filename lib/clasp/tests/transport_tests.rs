//! Tests for the hyper-backed transport against a mock server.

use std::time::Duration;

use bytes::Bytes;
use clasp::{HttpClient, HyperClient, Method, Request, RequestOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_request(server: &MockServer, request_path: &str) -> Request<Bytes> {
    let url = url::Url::parse(&format!("{}{request_path}", server.uri())).expect("url");
    Request::builder(Method::Get, url).build()
}

#[tokio::test]
async fn read_timeout_bounds_the_full_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HyperClient::new();
    let options = RequestOptions::new(Duration::from_secs(1), Duration::from_millis(50));

    let error = client
        .execute(get_request(&server, "/slow"), &options)
        .await
        .expect_err("should time out");
    assert!(error.is_timeout());
}

#[tokio::test]
async fn fast_response_completes_within_read_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = HyperClient::new();
    let options = RequestOptions::new(Duration::from_secs(1), Duration::from_secs(5));

    let response = client
        .execute(get_request(&server, "/fast"), &options)
        .await
        .expect("response");
    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), &Bytes::from_static(b"ok"));
}
