use thiserror::Error;

/// Top-level error type for the Inlustro assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<InlustroError>` where they need to surface configuration or
/// preference-storage failures through `?`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InlustroError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference storage error: {0}")]
    Preferences(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for InlustroError {
    fn from(err: toml::de::Error) -> Self {
        InlustroError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for InlustroError {
    fn from(err: toml::ser::Error) -> Self {
        InlustroError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for InlustroError {
    fn from(err: serde_json::Error) -> Self {
        InlustroError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Inlustro operations.
pub type Result<T> = std::result::Result<T, InlustroError>;
