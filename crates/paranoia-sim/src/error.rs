//! Error types for the simulation binary.
//!
//! [`SimError`] is the top-level error type that wraps all possible
//! failure modes during startup and the simulation run.

/// Top-level error for the simulation binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: paranoia_core::ConfigError,
    },

    /// A sanity operation or restore failed.
    #[error("sanity error: {source}")]
    Sanity {
        /// The underlying sanity error.
        #[from]
        source: paranoia_core::SanityError,
    },

    /// A built-in identifier failed validation.
    #[error("identifier error: {source}")]
    Identifier {
        /// The underlying identifier error.
        #[from]
        source: paranoia_types::IdentifierError,
    },

    /// Saved state could not be written or read as JSON text.
    #[error("save error: {source}")]
    Save {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
