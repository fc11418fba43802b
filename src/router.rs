//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Optionally fronted by
//! [`RequestLogging`], which then sees every request the router receives,
//! including the ones that end in `404`.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::RequestLogging;
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    logging: Option<RequestLogging>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use http::Method;
    /// # use reqlog::{Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Log every request through `logging`. A later call replaces an
    /// earlier one.
    pub fn layer(mut self, logging: RequestLogging) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Dispatches one request: logging (if layered), routing, handler.
    pub async fn call(&self, req: Request) -> Response {
        match &self.logging {
            Some(logging) => logging.handle(req, |req| self.route(req)).await,
            None => self.route(req).await,
        }
    }

    async fn route(&self, mut req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler.call(req).await
            }
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::Empty;

    use super::*;

    fn get(uri: &str) -> Request {
        Request::new(
            http::Request::get(uri)
                .body(Empty::<Bytes>::new())
                .expect("valid request"),
        )
    }

    async fn show(req: Request) -> String {
        format!("user {}", req.param("id").unwrap_or("?"))
    }

    #[tokio::test]
    async fn routes_with_params() {
        let app = Router::new().get("/users/{id}", show);
        let res = app.call(get("/users/42")).await;
        assert_eq!(res.body(), b"user 42");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let app = Router::new().get("/users/{id}", show);
        assert_eq!(app.call(get("/nope")).await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn method_mismatch_is_404() {
        let app = Router::new().post("/users/{id}", show);
        assert_eq!(app.call(get("/users/1")).await.status_code(), StatusCode::NOT_FOUND);
    }
}
