//! Body serialization and codec capabilities.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::{RequestTemplate, Response, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_urlencoded::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so a failure names the exact field that did not
/// deserialize (e.g. `order.customer.id`).
///
/// # Errors
///
/// Returns [`crate::Error::JsonDeserialization`] on failure.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

// ============================================================================
// Encoder / Decoder Capabilities
// ============================================================================

/// Capability for attaching a structured body to a request template.
///
/// Values cross the capability boundary as `serde_json::Value` so the trait
/// stays object-safe; typed call sites serialize with [`serde_json::to_value`]
/// first.
pub trait Encoder: Send + Sync {
    /// Encode `value` into the template's body.
    fn encode(&self, value: &serde_json::Value, template: &mut RequestTemplate) -> Result<()>;
}

/// Shared handle to an [`Encoder`].
pub type SharedEncoder = Arc<dyn Encoder>;

/// Default encoder producing `application/json` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, value: &serde_json::Value, template: &mut RequestTemplate) -> Result<()> {
        let body = to_json(value)?;
        template.body(body, ContentType::Json);
        Ok(())
    }
}

/// Encoder producing `application/x-www-form-urlencoded` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoder;

impl Encoder for FormEncoder {
    fn encode(&self, value: &serde_json::Value, template: &mut RequestTemplate) -> Result<()> {
        let body = to_form(value)?;
        template.body(body, ContentType::FormUrlEncoded);
        Ok(())
    }
}

/// Capability for post-processing a successful buffered response.
pub trait Decoder: Send + Sync {
    /// Decode the response, returning it (possibly transformed) or an error.
    fn decode(&self, response: Response<Bytes>) -> Result<Response<Bytes>>;
}

/// Shared handle to a [`Decoder`].
pub type SharedDecoder = Arc<dyn Decoder>;

/// Default decoder.
///
/// When the response declares a JSON content type and carries a body, the
/// body must parse as JSON; this catches HTML error pages served with a 200.
/// Responses with other content types pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, response: Response<Bytes>) -> Result<Response<Bytes>> {
        let declares_json = response
            .header("content-type")
            .or_else(|| response.header("Content-Type"))
            .is_some_and(|ct| ct.contains("json"));

        if declares_json && !response.body().is_empty() {
            let _: serde_json::Value = from_json(response.body())?;
        }
        Ok(response)
    }
}

// ============================================================================
// Query Map Encoding
// ============================================================================

/// Capability turning a raw query map into ordered query pairs.
pub trait QueryMapEncoder: Send + Sync {
    /// Flatten the map into the pairs appended to the request URL.
    fn encode(&self, map: &BTreeMap<String, String>) -> Vec<(String, String)>;
}

/// Shared handle to a [`QueryMapEncoder`].
pub type SharedQueryMapEncoder = Arc<dyn QueryMapEncoder>;

/// Default query-map encoder: key-sorted pairs, values as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedQueryMapEncoder;

impl QueryMapEncoder for SortedQueryMapEncoder {
    fn encode(&self, map: &BTreeMap<String, String>) -> Vec<(String, String)> {
        map.iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::Method;

    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn to_json_serialize() {
        #[derive(serde::Serialize)]
        struct Order {
            id: u64,
        }

        let bytes = to_json(&Order { id: 9 }).expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"id":9}"#);
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
            password: String,
        }

        let login = Login {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };
        let bytes = to_form(&login).expect("serialize");
        assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
    }

    #[test]
    fn from_json_path_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Customer {
            #[allow(dead_code)]
            id: u64,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Order {
            #[allow(dead_code)]
            customer: Customer,
        }

        let result: Result<Order> = from_json(br#"{"customer":{}}"#);
        let err = result.expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("customer"), "expected path in: {msg}");
        assert!(msg.contains("id"), "expected field in: {msg}");
    }

    #[test]
    fn json_encoder_sets_body() {
        let mut template = RequestTemplate::new(Method::Post, "/orders");
        let value = serde_json::json!({"id": 1});
        JsonEncoder.encode(&value, &mut template).expect("encode");

        let request = template.resolve("http://orders").expect("resolve");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn json_decoder_accepts_valid_json() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let response = Response::new(200, headers, Bytes::from(r#"{"ok":true}"#));
        assert!(JsonDecoder.decode(response).is_ok());
    }

    #[test]
    fn json_decoder_rejects_mislabeled_body() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let response = Response::new(200, headers, Bytes::from("<html>oops</html>"));
        assert!(JsonDecoder.decode(response).is_err());
    }

    #[test]
    fn json_decoder_passes_other_content_types() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let response = Response::new(200, headers, Bytes::from("pong"));
        assert!(JsonDecoder.decode(response).is_ok());
    }

    #[test]
    fn sorted_query_map_encoder_orders_keys() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());

        let pairs = SortedQueryMapEncoder.encode(&map);
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }
}
