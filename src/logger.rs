//! Structured, level-gated JSON logger.
//!
//! A [`Logger`] is an immutable value: chaining fields with
//! [`Logger::with_fields`] returns a new logger and leaves the receiver
//! untouched, so one base logger can be shared by every concurrent request
//! and specialised per request without coordination.
//!
//! Each emitted entry is a single JSON object on its own line:
//!
//! ```text
//! {"message":"","requestId":"5c1f…","severity":"debug","timestamp":"2024-05-01T09:30:00.123456789Z"}
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::level::Level;

/// Accumulated key/value pairs carried by a [`Logger`].
pub type Fields = Map<String, Value>;

/// Field that triggers `stackTrace` synthesis.
pub const ERROR_KEY: &str = "error";
/// Verbose rendering of the `error` field.
pub const STACK_TRACE_KEY: &str = "stackTrace";

const TIMESTAMP_KEY: &str = "timestamp";
const SEVERITY_KEY: &str = "severity";
const MESSAGE_KEY: &str = "message";

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Append-only structured logger.
///
/// Cloning is cheap: the sink and the field set are reference counted.
#[derive(Clone)]
pub struct Logger {
    level: Level,
    sink: Sink,
    fields: Arc<Fields>,
}

impl Logger {
    /// Creates a logger that writes entries at `level` and above to `sink`.
    pub fn new(level: Level, sink: impl Write + Send + 'static) -> Self {
        Self {
            level,
            sink: Arc::new(Mutex::new(Box::new(sink))),
            fields: Arc::new(Fields::new()),
        }
    }

    /// Logger writing to stdout at the level named by `LOGGING_LEVEL`
    /// (`debug` when unset).
    pub fn from_env() -> Self {
        Self::new(Level::from_env(), io::stdout())
    }

    pub fn level(&self) -> Level { self.level }
    pub fn fields(&self) -> &Fields { &self.fields }

    /// Whether an entry at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Returns a new logger carrying this logger's fields merged with
    /// `fields`. Later keys win. Nothing is logged.
    ///
    /// When the merged set holds an `error` field, a `stackTrace` field with
    /// a verbose rendering of it is added. It is recomputed whenever `fields`
    /// itself sets `error`.
    pub fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut merged = (*self.fields).clone();
        let mut error_set = false;
        for (key, value) in fields {
            let key = key.into();
            error_set |= key == ERROR_KEY;
            merged.insert(key, value.into());
        }

        let trace = match merged.get(ERROR_KEY) {
            Some(err) if error_set || !merged.contains_key(STACK_TRACE_KEY) => {
                Some(render_verbose(err))
            }
            _ => None,
        };
        if let Some(trace) = trace {
            merged.insert(STACK_TRACE_KEY.to_owned(), Value::String(trace));
        }

        self.derive(merged)
    }

    /// Shorthand for a single-pair [`with_fields`](Logger::with_fields).
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_fields([(key.into(), value.into())])
    }

    /// Attaches `err` as the `error` field and its `source()` chain as
    /// `stackTrace`.
    pub fn with_error<E: StdError + ?Sized>(&self, err: &E) -> Self {
        let mut merged = (*self.fields).clone();
        merged.insert(ERROR_KEY.to_owned(), Value::String(err.to_string()));
        merged.insert(STACK_TRACE_KEY.to_owned(), Value::String(error_chain(err)));
        self.derive(merged)
    }

    pub fn debug(&self, message: &str) { self.log(Level::Debug, message) }
    pub fn info(&self, message: &str) { self.log(Level::Info, message) }
    pub fn warn(&self, message: &str) { self.log(Level::Warn, message) }
    pub fn error(&self, message: &str) { self.log(Level::Error, message) }

    /// Writes one entry at `level`, or nothing if `level` is below the
    /// configured minimum.
    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let mut entry = Map::new();
        for (key, value) in self.fields.iter() {
            let key = match key.as_str() {
                TIMESTAMP_KEY | SEVERITY_KEY | MESSAGE_KEY => format!("fields.{key}"),
                _ => key.clone(),
            };
            entry.insert(key, value.clone());
        }
        entry.insert(
            TIMESTAMP_KEY.to_owned(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        entry.insert(SEVERITY_KEY.to_owned(), Value::from(level.as_str()));
        entry.insert(MESSAGE_KEY.to_owned(), Value::from(message));

        let mut line = Value::Object(entry).to_string();
        line.push('\n');

        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = write_line(sink.as_mut(), line.as_bytes()) {
            tracing::warn!(error = %e, "failed to write log entry");
        }
    }

    fn derive(&self, fields: Fields) -> Self {
        Self {
            level: self.level,
            sink: Arc::clone(&self.sink),
            fields: Arc::new(fields),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn write_line(sink: &mut dyn Write, line: &[u8]) -> io::Result<()> {
    sink.write_all(line)?;
    sink.flush()
}

fn render_verbose(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    if rendered.is_empty() { format!("{value:?}") } else { rendered }
}

fn error_chain<E: StdError + ?Sized>(err: &E) -> String {
    let mut out = err.to_string();
    if out.is_empty() {
        out = format!("{err:?}");
    }

    let mut source = err.source();
    if source.is_some() {
        out.push_str("\n\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        out.push_str(&format!("\n    {depth}: {cause}"));
        depth += 1;
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::Capture;

    #[test]
    fn chaining_merges_and_leaves_receiver_untouched() {
        let base = Logger::new(Level::Debug, io::sink());
        let first = base.with_fields([("a", json!(1)), ("b", json!(2))]);
        let second = first.with_fields([("b", json!(3)), ("c", json!(4))]);

        assert!(base.fields().is_empty());
        assert_eq!(first.fields().get("b"), Some(&json!(2)));
        assert_eq!(second.fields().get("a"), Some(&json!(1)));
        assert_eq!(second.fields().get("b"), Some(&json!(3)));
        assert_eq!(second.fields().get("c"), Some(&json!(4)));
        assert_eq!(second.fields().len(), 3);
    }

    #[test]
    fn chaining_does_not_emit() {
        let capture = Capture::default();
        let logger = Logger::new(Level::Debug, capture.clone());
        let _ = logger.with_field("k", "v");
        assert!(capture.is_empty());
    }

    #[test]
    fn error_field_synthesises_stack_trace() {
        let logger = Logger::new(Level::Debug, io::sink())
            .with_fields([("error", json!({"code": 7}))]);
        let trace = logger.fields().get(STACK_TRACE_KEY).and_then(Value::as_str);
        assert!(trace.is_some_and(|t| t.contains("\"code\": 7")));
    }

    #[test]
    fn empty_error_still_gets_a_stack_trace() {
        let logger = Logger::new(Level::Debug, io::sink()).with_field("error", "");
        let trace = logger.fields().get(STACK_TRACE_KEY).and_then(Value::as_str);
        assert!(trace.is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn stack_trace_survives_unrelated_chaining() {
        let logger = Logger::new(Level::Debug, io::sink())
            .with_field("error", "disk full")
            .with_field("attempt", 2);
        assert_eq!(
            logger.fields().get(STACK_TRACE_KEY),
            Some(&json!("disk full"))
        );
    }

    #[test]
    fn with_error_renders_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("loading config")]
        struct Outer(#[source] io::Error);

        let err = Outer(io::Error::new(io::ErrorKind::NotFound, "config.toml missing"));
        let logger = Logger::new(Level::Debug, io::sink()).with_error(&err);

        assert_eq!(logger.fields().get(ERROR_KEY), Some(&json!("loading config")));
        let trace = logger.fields()[STACK_TRACE_KEY].as_str().unwrap_or_default();
        assert!(trace.starts_with("loading config"));
        assert!(trace.contains("0: config.toml missing"));
    }

    #[test]
    fn below_threshold_writes_nothing() {
        let capture = Capture::default();
        let logger = Logger::new(Level::Warn, capture.clone());
        logger.debug("hidden");
        logger.info("hidden");
        assert!(capture.is_empty());

        logger.warn("shown");
        logger.error("shown");
        assert_eq!(capture.entries().len(), 2);
    }

    #[test]
    fn entry_has_canonical_keys_and_fields() {
        let capture = Capture::default();
        Logger::new(Level::Debug, capture.clone())
            .with_field("requestId", "abc")
            .warn("slow");

        let entries = capture.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["severity"], "warning");
        assert_eq!(entry["message"], "slow");
        assert_eq!(entry["requestId"], "abc");
        let ts = entry["timestamp"].as_str().unwrap_or_default();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn reserved_keys_are_prefixed() {
        let capture = Capture::default();
        Logger::new(Level::Debug, capture.clone())
            .with_field("message", "from field")
            .info("from call");

        let entry = &capture.entries()[0];
        assert_eq!(entry["message"], "from call");
        assert_eq!(entry["fields.message"], "from field");
    }

    #[test]
    fn derived_loggers_share_the_sink() {
        let capture = Capture::default();
        let base = Logger::new(Level::Info, capture.clone());
        base.info("one");
        base.with_field("k", 1).info("two");
        assert_eq!(capture.entries().len(), 2);
    }
}
