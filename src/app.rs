//! The application instance: an ordered middleware chain in front of a router.

use std::sync::Arc;

use http::{HeaderMap, Method};

use crate::handler::Handler;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The application.
///
/// Build it once at startup (usually through [`initialize`](crate::initialize)),
/// then hand it to [`Server::serve`](crate::Server::serve). Each builder call
/// returns `self` so registrations chain naturally.
///
/// ```rust
/// use http::Method;
/// use msgbridge::{App, Request, middleware::Cors};
///
/// async fn ping(_req: Request) -> &'static str { "pong" }
///
/// let app = App::new()
///     .layer(Cors::permissive())
///     .on(Method::GET, "/ping", ping);
/// assert_eq!(app.middleware_names(), ["cors"]);
/// ```
#[derive(Default)]
pub struct App {
    middleware: Vec<BoxedMiddleware>,
    router: Router,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` to the chain. Middleware runs in the order it
    /// was registered.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.router.add(method, path, handler);
        self
    }

    /// Names of the registered middleware, in chain order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Smallest body limit any registered middleware declares for a
    /// request with `headers`.
    pub fn body_limit(&self, headers: &HeaderMap) -> Option<usize> {
        self.middleware.iter().filter_map(|m| m.body_limit(headers)).min()
    }

    /// Runs `req` through the middleware chain and the router.
    pub async fn handle(&self, req: Request) -> Response {
        Next::new(&self.middleware, &self.router).run(req).await
    }
}
