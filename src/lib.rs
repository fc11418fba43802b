//! # reqlog
//!
//! Request/response logging middleware with correlation IDs, on top of a
//! minimal hyper-based HTTP framework.
//!
//! Every request that passes through [`middleware::RequestLogging`] gets:
//!
//! - a fresh UUID v4 request ID, returned to the client as `Request-ID`,
//! - a request-scoped [`Logger`] carrying that ID, reachable from the handler
//!   through [`Request::logger`] / [`Request::context`],
//! - one DEBUG entry describing the request and one describing the response
//!   (status, headers, body, duration).
//!
//! The middleware only observes. The bytes and status the client receives
//! are exactly what the handler produced, plus the `Request-ID` header.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use reqlog::middleware::RequestLogging;
//! use reqlog::{Logger, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqlog::Error> {
//!     let app = Router::new()
//!         .post("/items", create_item)
//!         .layer(RequestLogging::new(Logger::from_env()));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn create_item(req: Request) -> Response {
//!     req.logger().with_field("table", "items").info("inserting");
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .json(br#"{"id":7}"#.to_vec())
//! }
//! ```
//!
//! ## Log entries
//!
//! One JSON object per line with `timestamp`, `severity` and `message` plus
//! the logger's fields. The minimum level of [`Logger::from_env`] comes from
//! `LOGGING_LEVEL` (`debug`, `info`, `warn`, `error`; default `debug`).

mod context;
mod error;
mod handler;
mod level;
mod logger;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

#[cfg(test)]
mod testing;

pub use context::{Context, UNKNOWN_REQUEST_ID};
pub use error::{BoxError, Error};
pub use handler::Handler;
pub use level::{Level, LEVEL_ENV_KEY, ParseLevelError};
pub use logger::{ERROR_KEY, Fields, Logger, STACK_TRACE_KEY};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder, ResponseWriter};
pub use router::Router;
pub use server::Server;
