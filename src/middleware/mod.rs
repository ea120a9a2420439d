//! Middleware layer.
//!
//! Middleware intercepts a request before it reaches the router and sees the
//! response on the way back out. Each one receives the request plus a
//! [`Next`] continuation and may:
//!
//! - transform the request and call `next.run(req)`,
//! - decorate the response returned by `next.run`,
//! - or return its own response without calling `next` at all.
//!
//! Middleware runs in registration order. [`initialize`](crate::initialize)
//! registers exactly [`Cors`] then [`JsonBody`].

mod cors;
mod json;

pub use cors::Cors;
pub use json::JsonBody;

use std::sync::Arc;

use http::HeaderMap;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::router::Router;

/// A request filter in the application's middleware chain.
///
/// ```rust
/// use msgbridge::BoxFuture;
/// use msgbridge::middleware::{Middleware, Next};
/// use msgbridge::Request;
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
///         Box::pin(async move {
///             let mut res = next.run(req).await;
///             res.headers_mut().insert("x-powered-by", "msgbridge".parse().unwrap());
///             res
///         })
///     }
///
///     fn name(&self) -> &'static str { "powered-by" }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Largest request body, in bytes, this middleware accepts for a
    /// request with these headers. The server stops buffering past the
    /// smallest declared limit and flags the request instead.
    fn body_limit(&self, _headers: &HeaderMap) -> Option<usize> {
        None
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain after the current middleware.
pub struct Next<'a> {
    rest: &'a [BoxedMiddleware],
    router: &'a Router,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [BoxedMiddleware], router: &'a Router) -> Self {
        Self { rest: chain, router }
    }

    /// Passes `req` to the next middleware, or to the router once the chain
    /// is exhausted.
    pub fn run(self, req: Request) -> BoxFuture<'a> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(req, Next { rest, router: self.router }),
            None => Box::pin(self.router.route(req)),
        }
    }
}
