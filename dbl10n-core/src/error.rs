//! Error types for the import tool.
//!
//! Connection parameters reach the driver as typed options, never as a
//! connection string, so none of these messages can carry a password.

use thiserror::Error;

/// Main error type for DB-l10n import operations.
#[derive(Debug, Error)]
pub enum DbL10nError {
    /// Opening the database session failed
    #[error("Database connection failed: {context}")]
    Connection {
        /// What was being attempted
        context: String,
        /// Driver error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A statement issued during import or maintenance failed
    #[error("Query execution failed: {context}")]
    Query {
        /// What was being attempted
        context: String,
        /// Driver error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid parameter or unusable target database state
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human readable description
        message: String,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        /// What was being attempted
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization of the import report failed
    #[error("Serialization failed: {context}")]
    Serialization {
        /// What was being serialized
        context: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with `DbL10nError`
pub type Result<T> = std::result::Result<T, DbL10nError>;

impl DbL10nError {
    /// Creates a connection error from a driver error
    pub fn connection_failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: "Could not open a session with the target database".to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a query error with context
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Renders the error followed by its chain of causes, one per line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
