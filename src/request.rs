//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An incoming HTTP request with its body already collected.
///
/// Middleware may enrich the request before it reaches a handler; the JSON
/// body parser stores the decoded body here, readable through [`Request::json`].
pub struct Request {
    head: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
    json: Option<Value>,
    body_over_limit: bool,
}

impl Request {
    pub(crate) fn new(head: Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        Self { head, body, params: HashMap::new(), remote_addr, json: None, body_over_limit: false }
    }

    /// Wraps an already-buffered `http::Request`. Useful for driving an
    /// [`App`](crate::App) without a socket.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (head, body) = req.into_parts();
        Self::new(head, body, None)
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup. Values that are not visible ASCII
    /// are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/chats/{id}`, `req.param("id")` on `/chats/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The body decoded by [`JsonBody`](crate::middleware::JsonBody), if
    /// that middleware ran and the request carried `application/json`.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Deserializes the decoded JSON body into `T`.
    ///
    /// Returns `None` when no JSON body was parsed.
    pub fn json_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.json.as_ref().map(|v| T::deserialize(v))
    }

    /// `true` when the server stopped reading the body because it exceeded
    /// the limit a middleware declared through
    /// [`Middleware::body_limit`](crate::middleware::Middleware::body_limit).
    /// The body is then empty.
    pub fn body_over_limit(&self) -> bool {
        self.body_over_limit
    }

    pub(crate) fn mark_body_over_limit(&mut self) {
        self.body_over_limit = true;
    }

    pub(crate) fn set_json(&mut self, value: Value) {
        self.json = Some(value);
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn request(body: &'static str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method(Method::POST)
                .uri("/sessions/abc?verbose=1")
                .header("Content-Type", "application/json")
                .body(Bytes::from_static(body.as_bytes()))
                .unwrap(),
        )
    }

    #[test]
    fn exposes_head_and_body() {
        let req = request("{}");
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.path(), "/sessions/abc");
        assert_eq!(req.uri().query(), Some("verbose=1"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body(), b"{}");
        assert!(req.remote_addr().is_none());
        assert!(req.json().is_none());
    }

    #[test]
    fn typed_json_access() {
        #[derive(Deserialize)]
        struct Payload {
            a: i64,
        }

        let mut req = request(r#"{"a":1}"#);
        assert!(req.json_as::<Payload>().is_none());

        req.set_json(serde_json::json!({ "a": 1 }));
        let payload = req.json_as::<Payload>().unwrap().unwrap();
        assert_eq!(payload.a, 1);
        assert!(req.json_as::<Vec<u8>>().unwrap().is_err());
    }
}
