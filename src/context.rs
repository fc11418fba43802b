//! Per-request correlation context.
//!
//! A [`Context`] is an immutable chain of bindings. Deriving a child adds one
//! binding on top and shares the rest with the parent, so handing a context
//! to a handler never lets the handler change what the caller sees.

use std::io;
use std::sync::Arc;

use crate::level::Level;
use crate::logger::Logger;

/// Returned by [`Context::request_id`] when no ID is bound.
pub const UNKNOWN_REQUEST_ID: &str = "Unknown";

/// Layered request-ID / logger carrier.
#[derive(Clone, Debug, Default)]
pub struct Context {
    head: Option<Arc<Layer>>,
}

#[derive(Debug)]
struct Layer {
    binding: Binding,
    parent: Option<Arc<Layer>>,
}

#[derive(Debug)]
enum Binding {
    RequestId(String),
    Logger(Logger),
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child context with `id` bound as the request ID.
    pub fn with_request_id(&self, id: impl Into<String>) -> Self {
        self.push(Binding::RequestId(id.into()))
    }

    /// Child context with `logger` bound.
    pub fn with_logger(&self, logger: Logger) -> Self {
        self.push(Binding::Logger(logger))
    }

    /// The nearest bound request ID, or `"Unknown"`.
    pub fn request_id(&self) -> &str {
        self.layers()
            .find_map(|binding| match binding {
                Binding::RequestId(id) => Some(id.as_str()),
                Binding::Logger(_) => None,
            })
            .unwrap_or(UNKNOWN_REQUEST_ID)
    }

    /// The nearest bound logger, or a new INFO logger on stdout.
    pub fn logger(&self) -> Logger {
        self.layers()
            .find_map(|binding| match binding {
                Binding::Logger(logger) => Some(logger.clone()),
                Binding::RequestId(_) => None,
            })
            .unwrap_or_else(|| Logger::new(Level::Info, io::stdout()))
    }

    fn push(&self, binding: Binding) -> Self {
        Self {
            head: Some(Arc::new(Layer { binding, parent: self.head.clone() })),
        }
    }

    fn layers(&self) -> impl Iterator<Item = &Binding> {
        std::iter::successors(self.head.as_deref(), |layer| layer.parent.as_deref())
            .map(|layer| &layer.binding)
    }
}
