use thiserror::Error;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid configuration for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    // ── Document pipeline errors ─────────────────────────────────────────────
    #[error("Failed to load document '{path}': {source}")]
    DocumentLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── AI Agent errors ──────────────────────────────────────────────────────
    #[error("Ollama service unavailable at {host}")]
    OllamaUnavailable { host: String },

    #[error("Model '{model_name}' not found in Ollama")]
    ModelNotFound { model_name: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    #[error("Embedding model unavailable: {message}")]
    EmbeddingUnavailable { message: String },

    #[error("Embedding failed: {message}")]
    EmbeddingFailed { message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Invalid filter expression '{expression}': {message}")]
    InvalidFilterExpression { expression: String, message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidConfig { key: key.into(), message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::EmptyField { .. } | AppError::InvalidFilterExpression { .. }
        )
    }

    pub fn is_agent_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::OllamaUnavailable { .. } | AppError::EmbeddingUnavailable { .. }
        )
    }
}
