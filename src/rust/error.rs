// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the proving core.
//!
//! Adapter failures never surface through this type: routers, the hybrid
//! prover and the integration adapter convert them into recorded results.
//! What remains here is misconfiguration and malformed input.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the proving core.
#[derive(Error, Debug)]
pub enum Error {
    /// A strategy name did not match any known strategy
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Single-prover selection found nothing registered
    #[error("No provers available")]
    NoProversAvailable,

    /// Hybrid weights that cannot be normalised
    #[error("Invalid prover weights: neural={neural}, symbolic={symbolic}")]
    InvalidWeights { neural: f64, symbolic: f64 },

    /// Formula text could not be parsed
    #[error("Failed to parse formula '{input}' near '{remainder}'")]
    Parse { input: String, remainder: String },

    /// Formula nesting beyond the supported depth
    #[error("Formula is nested deeper than {0} levels")]
    TooDeep(usize),

    /// A formula value that analysis or translation cannot accept
    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error for `input`, pointing at the unconsumed `remainder`.
    pub fn parse(input: impl Into<String>, remainder: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            remainder: remainder.into(),
        }
    }

    /// Whether this error reflects a programming/configuration mistake rather
    /// than bad runtime input.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownStrategy(_) | Self::InvalidWeights { .. } | Self::Config(_) | Self::Toml(_)
        )
    }
}
