//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in one
//! `HashMap<Method, matchit::Router<_>>`. A collection holds one concrete
//! type, so every handler is hidden behind `dyn ErasedHandler` and shared as
//! an `Arc`.
//!
//! ```text
//! async fn create(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.post("/items", create)
//! create.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(create))                      ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { create(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! Logging middleware plugs in at the same seam: [`RequestLogging::wrap`]
//! returns a closure, and closures of the right shape are handlers too, so a
//! wrapped handler is stored and called exactly like a plain one.
//!
//! [`RequestLogging::wrap`]: crate::middleware::RequestLogging::wrap

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// The runtime polls the future in place and must not move it after the
/// first poll, hence `Pin<Box<…>>`. `Send + 'static` lets tokio move it
/// between worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
///
/// One atomic increment per request when the router or
/// [`RequestLogging::wrap`](crate::middleware::RequestLogging::wrap) clones
/// it; the handler itself is never copied.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` or
/// closure with the signature:
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoResponse>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

/// `Sealed` is private, so other crates cannot name it and cannot implement
/// `Handler` for their own types.
mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

/// `Fn(Request) -> Fut` covers named `async fn` items, closures returning an
/// `async` block (what `RequestLogging::wrap` produces) and any type that
/// implements `Fn`.
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

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Map whatever the handler returns into a `Response` and box it so
        // every handler yields the same future type.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
