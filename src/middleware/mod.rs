//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. reqlog ships one: [`RequestLogging`], which gives
//! every request a correlation ID and writes structured request/response
//! entries through a [`Logger`](crate::Logger).
//!
//! Attach it to a whole router with [`Router::layer`](crate::Router::layer),
//! or to one handler with [`RequestLogging::wrap`].

mod recorder;
mod request_log;

pub use recorder::Recorder;
pub use request_log::{Options, RequestLogging, REQUEST_ID_FIELD, REQUEST_ID_HEADER};
