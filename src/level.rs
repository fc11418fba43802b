//! Log severity levels.
//!
//! Levels are ordered: `Debug < Info < Warn < Error`. A logger configured at
//! a given level emits entries at that level and above.

use std::fmt;
use std::str::FromStr;

/// Environment variable read by [`Level::from_env`].
pub const LEVEL_ENV_KEY: &str = "LOGGING_LEVEL";

/// Severity of a log entry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Returns the name written to the `severity` key of an entry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info  => "info",
            Self::Warn  => "warning",
            Self::Error => "error",
        }
    }

    /// Maps a configuration name to a level.
    ///
    /// Exact, case-sensitive match against `debug`, `info`, `warn` and
    /// `error`. Anything else resolves to [`Level::Debug`]; use
    /// [`str::parse`] when an unknown name should be an error instead.
    pub fn from_name(name: &str) -> Self {
        match name {
            "info"  => Self::Info,
            "warn"  => Self::Warn,
            "error" => Self::Error,
            _       => Self::Debug,
        }
    }

    /// Reads the level from `LOGGING_LEVEL`, defaulting to `debug`.
    pub fn from_env() -> Self {
        from_env_value(std::env::var(LEVEL_ENV_KEY).ok().as_deref())
    }
}

pub(crate) fn from_env_value(value: Option<&str>) -> Level {
    match value {
        Some(v) => Level::from_name(&v.to_lowercase()),
        None    => Level::Debug,
    }
}

/// Returned by the strict [`FromStr`] impl for an unrecognized level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}`")]
pub struct ParseLevelError(String);

/// Strict parse. Accepts `warning` as well as `warn` so that
/// [`Level::as_str`] round-trips.
impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug"             => Ok(Self::Debug),
            "info"              => Ok(Self::Info),
            "warn" | "warning"  => Ok(Self::Warn),
            "error"             => Ok(Self::Error),
            _                   => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
