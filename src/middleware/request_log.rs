//! Request/response logging with correlation IDs.
//!
//! For every request [`RequestLogging`]:
//!
//! 1. generates a UUID v4 request ID and binds it, together with a logger
//!    carrying a `requestId` field, into the request's [`Context`],
//! 2. logs the request (method, URI, headers, body…) at DEBUG,
//! 3. runs the next handler and replays its response through a
//!    [`Recorder`], adding a `Request-ID` header,
//! 4. logs the response (status, headers, body, duration) at DEBUG.
//!
//! Step 4 is owned by a drop guard, so it happens exactly once even when the
//! handler panics or the request future is dropped mid-flight.
//!
//! [`Context`]: crate::Context

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::handler::Handler;
use crate::level::Level;
use crate::logger::Logger;
use crate::middleware::recorder::Recorder;
use crate::request::Request;
use crate::response::{Response, ResponseWriter};

/// Response header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "request-id";

/// Logger field carrying the request ID.
pub const REQUEST_ID_FIELD: &str = "requestId";

const BODY_ERROR_FIELD: &str = "bodyError";

/// Middleware options.
///
/// Deserializes from `{"logResponse": false}`; missing keys take defaults.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Emit the response entry. Default `true`.
    pub log_response: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { log_response: true }
    }
}

/// Request/response logging middleware.
///
/// Cheap to clone; share one instance across the whole application.
///
/// Handlers never see the recording sink. The response they return is
/// replayed into a [`Recorder`] after they finish, and that replay is what
/// gets logged and sent.
///
/// ```rust,no_run
/// use reqlog::{Level, Logger, Request, Response, Router};
/// use reqlog::middleware::RequestLogging;
///
/// # async fn create(_: Request) -> Response { Response::text("") }
/// let logging = RequestLogging::new(Logger::new(Level::Debug, std::io::stdout()));
///
/// let app = Router::new()
///     .post("/items", create)
///     .layer(logging);
/// ```
#[derive(Clone, Debug)]
pub struct RequestLogging {
    logger: Logger,
    options: Options,
}

impl RequestLogging {
    pub fn new(logger: Logger) -> Self {
        Self::with_options(logger, Options::default())
    }

    pub fn with_options(logger: Logger, options: Options) -> Self {
        Self { logger, options }
    }

    /// Uses [`Logger::from_env`] as the base logger.
    pub fn from_env() -> Self {
        Self::new(Logger::from_env())
    }

    pub fn options(&self) -> Options { self.options }

    /// Runs `next` for `req` with request and response logging around it.
    pub async fn handle<F, Fut>(&self, mut req: Request, next: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let start = Instant::now();

        let request_id = Uuid::new_v4().to_string();
        let logger = self.logger.with_field(REQUEST_ID_FIELD, request_id.as_str());
        req.context = req
            .context
            .with_request_id(request_id.as_str())
            .with_logger(logger.clone());

        log_request(&logger, &mut req).await;

        let mut recorder = Recorder::new(Response::default());
        if let Ok(value) = HeaderValue::try_from(request_id.as_str()) {
            recorder
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        let mut pending = PendingResponseLog {
            api: format!("{}_{}", req.method(), req.path()),
            enabled: self.options.log_response,
            logger,
            recorder: Some(recorder),
            start,
        };

        let response = next(req).await;
        if let Some(recorder) = pending.recorder.as_mut() {
            if let Err(e) = response.write_to(recorder) {
                pending.logger.with_error(&e).warn("failed to write response");
            }
        }
        pending.finish()
    }

    /// Wraps a single handler.
    ///
    /// ```rust,no_run
    /// use reqlog::{Logger, Request, Response, Router};
    /// use reqlog::middleware::RequestLogging;
    ///
    /// # async fn create(_: Request) -> Response { Response::text("") }
    /// let logging = RequestLogging::new(Logger::from_env());
    /// let app = Router::new().post("/items", logging.wrap(create));
    /// ```
    pub fn wrap(self, handler: impl Handler) -> impl Handler {
        let inner = handler.into_boxed_handler();
        let this = Arc::new(self);
        move |req: Request| {
            let this = Arc::clone(&this);
            let inner = Arc::clone(&inner);
            async move { this.handle(req, |req| inner.call(req)).await }
        }
    }
}

// ── Response log guard ────────────────────────────────────────────────────────

/// Owns the recorder until the response is logged.
///
/// `finish` logs and hands back the recorded response. If the guard is
/// dropped without `finish` (panic, cancellation) the log still happens, with
/// whatever the recorder saw.
struct PendingResponseLog {
    api: String,
    enabled: bool,
    logger: Logger,
    recorder: Option<Recorder<Response>>,
    start: Instant,
}

impl PendingResponseLog {
    fn finish(mut self) -> Response {
        match self.recorder.take() {
            Some(recorder) => {
                self.log(&recorder);
                recorder.into_inner()
            }
            None => Response::default(),
        }
    }

    fn log(&self, recorder: &Recorder<Response>) {
        if self.enabled {
            log_response(&self.logger, self.start, &self.api, recorder);
        }
    }
}

impl Drop for PendingResponseLog {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            self.log(&recorder);
        }
    }
}

// ── Entries ───────────────────────────────────────────────────────────────────

async fn log_request(logger: &Logger, req: &mut Request) {
    if !logger.enabled(Level::Debug) {
        return;
    }

    let (logger, body) = if req.has_body() {
        match req.body_bytes().await {
            Ok(bytes) => decode_body(logger, &bytes),
            Err(e) => (logger.with_field(BODY_ERROR_FIELD, e.to_string()), Value::Null),
        }
    } else {
        (logger.clone(), Value::Null)
    };

    let remote_addr = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();
    logger
        .with_fields([
            ("remoteAddr", Value::from(remote_addr)),
            ("protocol", Value::from(format!("{:?}", req.version()))),
            ("method", Value::from(req.method().as_str())),
            ("header", headers_json(req.headers())),
            ("uri", Value::from(request_target(req))),
            ("userAgent", Value::from(req.user_agent().unwrap_or_default())),
            ("requestBody", body),
        ])
        .debug("request");
}

fn log_response(logger: &Logger, start: Instant, api: &str, recorder: &Recorder<Response>) {
    if !logger.enabled(Level::Debug) {
        return;
    }

    let (logger, body) = match recorder.body() {
        Some(bytes) => decode_body(logger, bytes),
        None => (logger.clone(), Value::Null),
    };
    let duration = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);

    logger
        .with_fields([
            ("duration", Value::from(duration)),
            ("header", headers_json(recorder.headers())),
            ("responseBody", body),
            ("status", Value::from(recorder.status().as_u16())),
            ("api", Value::from(api)),
        ])
        .debug("response");
}

/// Path and query as the client sent them. HTTP/2 requests arrive in
/// absolute form, so scheme and authority are dropped.
fn request_target(req: &Request) -> &str {
    req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// JSON-decodes `bytes`; on failure returns the raw text and a logger with a
/// `bodyError` field.
fn decode_body(logger: &Logger, bytes: &[u8]) -> (Logger, Value) {
    match serde_json::from_slice(bytes) {
        Ok(value) => (logger.clone(), value),
        Err(e) => (
            logger.with_field(BODY_ERROR_FIELD, e.to_string()),
            Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ),
    }
}

/// `{"name": ["value", …], …}`
fn headers_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| Value::from(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        map.insert(name.as_str().to_owned(), Value::Array(values));
    }
    Value::Object(map)
}
