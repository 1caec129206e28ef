//! Error types for the slide markup engine.
//!
//! Document input never fails: malformed markup degrades to plain text and
//! malformed grid annotations are reported as [`crate::RatioError`] values.
//! These errors cover the typed edges only (configuration and token decoding).

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring the engine or decoding its types.
#[derive(Error, Debug)]
pub enum Error {
    /// Split level outside the supported 1..=3 range.
    #[error("Invalid split level {0}: expected 1, 2 or 3")]
    InvalidSplitLevel(u8),

    /// A string that is not one of the known attribute tokens.
    #[error("Unknown attribute token: {0:?}")]
    UnknownAttribute(String),

    /// An engine configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration document could not be decoded.
    #[error("Failed to decode configuration: {0}")]
    Json(#[from] serde_json::Error),
}
