//! Error types for trace ingestion and mobility tracking

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the library.
///
/// Malformed *input data* is never an `Error` at the file level: the parser
/// and tracker record an [`Anomaly`](crate::anomaly::Anomaly) and carry on.
/// `Error` covers I/O, configuration, sub-tree grammar failures (which the
/// block router converts into anomalies) and caller contract violations.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Parsing Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Structural parse failure: {message} (line: {line:?})")]
    StructuralParse { line: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Tracker Contract Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Entry fed out of timestamp order: {current_ms} ms after {previous_ms} ms")]
    OutOfOrder { previous_ms: i64, current_ms: i64 },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn structural(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructuralParse {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::StructuralParse { .. } | Error::Config { .. })
    }

    /// Check if this error should abort the current run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Io(_) | Error::OutOfOrder { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
