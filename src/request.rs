//! Incoming HTTP request type.

use std::collections::HashMap;
use std::convert::Infallible;
use std::mem;
use std::net::SocketAddr;

use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderMap, Method, Uri, Version};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Body as HttpBody;

use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::logger::Logger;

pub(crate) type Body = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request.
///
/// The body stays a stream until someone asks for it. [`Request::body_bytes`]
/// buffers it once and keeps the buffer, so any number of readers see the
/// same bytes.
pub struct Request {
    pub(crate) head: http::request::Parts,
    pub(crate) body: Body,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) context: Context,
}

impl Request {
    /// Wraps an [`http::Request`] with any byte body.
    pub fn new<B>(req: http::Request<B>) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (head, body) = req.into_parts();
        Self {
            head,
            body: body.map_err(|e| -> BoxError { e.into() }).boxed_unsync(),
            params: HashMap::new(),
            remote_addr: None,
            context: Context::new(),
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn version(&self) -> Version { self.head.version }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.head.headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn context(&self) -> &Context { &self.context }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    /// Shorthand for `self.context().request_id()`.
    pub fn request_id(&self) -> &str {
        self.context.request_id()
    }

    /// Shorthand for `self.context().logger()`.
    pub fn logger(&self) -> Logger {
        self.context.logger()
    }

    /// `false` once the body is known to be empty.
    pub fn has_body(&self) -> bool {
        !self.body.is_end_stream()
    }

    /// Reads the whole body and puts an identical buffered copy back, so the
    /// next caller gets the same bytes.
    ///
    /// On a read error the body is left empty.
    pub async fn body_bytes(&mut self) -> Result<Bytes, Error> {
        let body = mem::replace(&mut self.body, empty_body());
        let bytes = body.collect().await.map_err(Error::Body)?.to_bytes();
        self.body = full_body(bytes.clone());
        Ok(bytes)
    }
}

fn empty_body() -> Body {
    Empty::<Bytes>::new().map_err(|never: Infallible| match never {}).boxed_unsync()
}

fn full_body(bytes: Bytes) -> Body {
    Full::new(bytes).map_err(|never: Infallible| match never {}).boxed_unsync()
}
