//! # msgbridge
//!
//! HTTP front for a messaging-library bridge. This crate owns process
//! bootstrap: it prints the startup banner, builds the application instance,
//! and wires the two request filters every route relies on:
//!
//! 1. **[`Cors`](middleware::Cors)**: any origin, any method, any header.
//!    Preflights are answered before routing.
//! 2. **[`JsonBody`](middleware::JsonBody)**: `application/json` bodies are
//!    decoded into a [`serde_json::Value`] and exposed as [`Request::json`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use msgbridge::{Config, Json, Request, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), msgbridge::Error> {
//!     let app = msgbridge::initialize()
//!         .on(Method::POST, "/echo", echo);
//!
//!     let config = Config::from_env()?;
//!     Server::bind(config.addr).serve(app).await
//! }
//!
//! async fn echo(req: Request) -> Json<serde_json::Value> {
//!     Json(req.json().cloned().unwrap_or_default())
//! }
//! ```

mod app;
mod bootstrap;
mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use app::App;
pub use bootstrap::{
    FEATURE_NOTE, LIBRARY_VERSION, RUNTIME_VERSION, SERVICE_NAME, VERSION, initialize,
    initialize_to,
};
pub use config::Config;
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use server::Server;
