//! Unified error type.

/// Boxed error produced by request body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by reqlog's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding, accepting, and reading request bodies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("reading request body: {0}")]
    Body(#[source] BoxError),
}
