//! Handler trait and type erasure.
//!
//! The router holds handlers of different concrete types in one table, so
//! each handler is wrapped and stored as a trait object:
//!
//! ```text
//! async fn status(req: Request) -> Response { … }   ← user writes this
//!        ↓ app.on(Method::GET, "/status", status)
//! status.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(status))                       ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time                ← one vtable dispatch
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// Handlers produce `BoxFuture<'static>`; middleware futures borrow the
/// chain they run in and use a shorter lifetime.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<'static>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `async fn name(req: Request) -> impl IntoResponse`.
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    async fn accepted(_req: Request) -> StatusCode {
        StatusCode::ACCEPTED
    }

    #[tokio::test]
    async fn async_fn_becomes_boxed_handler() {
        let handler = accepted.into_boxed_handler();
        let req = Request::from_http(http::Request::new(Bytes::new()));
        let res = handler.call(req).await;
        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
    }
}
