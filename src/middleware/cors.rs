//! Cross-origin resource sharing.
//!
//! [`Cors::permissive`] allows every origin, method and header. Preflight
//! (`OPTIONS`) requests are answered here with `204 No Content` and never
//! reach the router; every other response gets `Access-Control-Allow-Origin`.

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    CONTENT_LENGTH, HeaderMap, HeaderValue, ORIGIN, VARY,
};
use http::{Method, StatusCode};
use tracing::debug;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

const DEFAULT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

enum AllowOrigin {
    Any,
    List(Vec<String>),
}

/// CORS policy middleware.
pub struct Cors {
    origin: AllowOrigin,
    methods: HeaderValue,
    expose_headers: Option<HeaderValue>,
    max_age: Option<u64>,
}

impl Cors {
    /// Allow any origin (`*`), the standard method set, and whatever headers
    /// the preflight asks for. No credentials.
    pub fn permissive() -> Self {
        Self {
            origin: AllowOrigin::Any,
            methods: HeaderValue::from_static(DEFAULT_METHODS),
            expose_headers: None,
            max_age: None,
        }
    }

    /// Restrict to an exact-match list of origins. A matching origin is
    /// echoed back with `Vary: Origin`; others get no allow header.
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin = AllowOrigin::List(origins.into_iter().map(Into::into).collect());
        self
    }

    /// Headers the browser may read from the response.
    ///
    /// # Panics
    ///
    /// Panics if the joined list is not a valid header value.
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        let joined = headers.join(",");
        let value = HeaderValue::try_from(joined.as_str())
            .unwrap_or_else(|e| panic!("invalid expose-headers `{joined}`: {e}"));
        self.expose_headers = Some(value);
        self
    }

    /// How long, in seconds, a preflight result may be cached.
    pub fn max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Writes the allow-origin header (and `Vary` when origin-dependent)
    /// without overwriting one a handler already set.
    fn apply_origin(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            return;
        }
        match &self.origin {
            AllowOrigin::Any => {
                headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
            AllowOrigin::List(allowed) => {
                headers.append(VARY, HeaderValue::from_static("Origin"));
                let matched = origin
                    .filter(|o| o.to_str().is_ok_and(|o| allowed.iter().any(|a| a == o)));
                if let Some(o) = matched {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, o.clone());
                }
            }
        }
    }

    fn preflight(&self, req: &Request) -> Response {
        let mut res = Response::status(StatusCode::NO_CONTENT);
        let headers = res.headers_mut();

        self.apply_origin(req.headers().get(ORIGIN), headers);
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        if let Some(requested) = req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
        }
        if let Some(secs) = self.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(secs));
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        res
    }
}

impl Default for Cors {
    fn default() -> Self { Self::permissive() }
}

impl Middleware for Cors {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        if *req.method() == Method::OPTIONS {
            debug!(path = req.path(), "answering CORS preflight");
            let res = self.preflight(&req);
            return Box::pin(async move { res });
        }

        let origin = req.headers().get(ORIGIN).cloned();
        Box::pin(async move {
            let mut res = next.run(req).await;
            self.apply_origin(origin.as_ref(), res.headers_mut());
            if let Some(expose) = &self.expose_headers {
                res.headers_mut().insert(ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
            }
            res
        })
    }

    fn name(&self) -> &'static str { "cors" }
}
