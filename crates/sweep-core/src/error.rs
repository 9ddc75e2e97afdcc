//! Error types and result aliases for sweep.
//!
//! Only configuration and fetch failures are errors. A failed deletion is a
//! per-item outcome recorded in the deletion report and never escalates.

/// The result type used throughout sweep.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a sweep run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The run was misconfigured. Raised before any network call.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the invalid setting.
        message: String,
    },

    /// A listing required for the decision could not be fetched or decoded.
    #[error("fetch error: {message}")]
    Fetch {
        /// Description of the failed fetch.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration error with the given message.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new fetch error with the given message.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised before any network call.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
