//! Minimal reqlog example — JSON endpoints with request/response logging.
//!
//! Run with:
//!   LOGGING_LEVEL=debug RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/items/42
//!   curl -i -X POST http://localhost:3000/items \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"widget"}'
//!   curl -i -X POST http://localhost:3000/items -d 'not json'
//!
//! Every response carries a `Request-ID` header; the same ID appears as
//! `requestId` on both log lines written to stdout.

use http::StatusCode;
use reqlog::middleware::RequestLogging;
use reqlog::{Logger, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), reqlog::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .get("/items/{id}",    get_item)
        .post("/items",        create_item)
        .delete("/items/{id}", delete_item)
        .layer(RequestLogging::from_env());

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /items/{id}
async fn get_item(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"widget"}}"#).into_bytes())
}

// POST /items
//
// The middleware has already read the body for logging; reading it again
// here returns the same bytes.
async fn create_item(mut req: Request) -> Response {
    let body = match req.body_bytes().await {
        Ok(body) if !body.is_empty() => body,
        _ => return Response::status(StatusCode::BAD_REQUEST),
    };

    if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
        req.logger().warn("rejecting non-JSON item");
        return Response::status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/items/99")
        .json(br#"{"id":"99"}"#.to_vec())
}

// DELETE /items/{id} → 204 No Content
async fn delete_item(req: Request) -> Response {
    req.logger()
        .with_field("id", req.param("id").unwrap_or_default())
        .info("deleting item");
    Response::status(StatusCode::NO_CONTENT)
}
