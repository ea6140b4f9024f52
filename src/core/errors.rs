//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Request body lacks one of the required fields
    #[error("Missing required parameters. Please provide {fields}.")]
    MissingParameters {
        fields: &'static str,
    },

    /// The model failed while generating
    #[error("{message}")]
    InferenceError {
        message: String,
    },

    /// The GGUF file could not be loaded
    #[error("Failed to load model {path}: {message}")]
    ModelLoadError {
        path: String,
        message: String,
    },

    /// Prompt does not fit into the model context
    #[error("Prompt has {tokens} tokens but the context holds only {n_ctx}")]
    PromptTooLong {
        tokens: usize,
        n_ctx: u32,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Unexpected runtime failure
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl TranslationError {
    /// Whether the error was caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, TranslationError::MissingParameters { .. })
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
