//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. The router is the
//! innermost step of an [`App`](crate::App): middleware runs first, then the
//! matched handler, or `404 Not Found` when nothing matches.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

#[derive(Default)]
pub(crate) struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    /// # Panics
    ///
    /// Panics on a malformed or conflicting path; routes are registered at
    /// startup, so this surfaces before the server accepts traffic.
    pub(crate) fn add(&mut self, method: Method, path: &str, handler: impl Handler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    pub(crate) async fn route(&self, mut req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req).await
            }
            None => {
                debug!(method = %req.method(), path = req.path(), "no route");
                Response::status(StatusCode::NOT_FOUND)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn chat(req: Request) -> String {
        format!("chat {}", req.param("id").unwrap_or("?"))
    }

    fn request(method: Method, path: &str) -> Request {
        Request::from_http(
            http::Request::builder().method(method).uri(path).body(Bytes::new()).unwrap(),
        )
    }

    #[tokio::test]
    async fn matches_method_and_path_params() {
        let mut router = Router::default();
        router.add(Method::GET, "/chats/{id}", chat);

        let res = router.route(request(Method::GET, "/chats/42")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"chat 42");

        let res = router.route(request(Method::POST, "/chats/42")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

        let res = router.route(request(Method::GET, "/contacts")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let mut router = Router::default();
        router.add(Method::GET, "/chats/{id}", chat);
        router.add(Method::GET, "/chats/{id}", chat);
    }
}
