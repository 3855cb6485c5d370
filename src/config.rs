use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

/// Runtime settings, read from the environment (a `.env` file is loaded first by `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_embedding_model: String,
    pub documents_dir: PathBuf,
    pub static_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub similarity_threshold: f64,
    pub memory_max_messages: usize,
    /// Run the terminal chat alongside the HTTP server.
    pub cli_enabled: bool,
    pub cli_filter_expression: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            ollama_embedding_model: "nomic-embed-text".to_string(),
            documents_dir: PathBuf::from("documents"),
            static_dir: PathBuf::from("frontend/dist"),
            chunk_size: 200,
            chunk_overlap: 100,
            top_k: 3,
            similarity_threshold: 0.3,
            memory_max_messages: 10,
            cli_enabled: false,
            cli_filter_expression: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            ollama_base_url: lookup("OLLAMA_API_BASE_URL").unwrap_or(defaults.ollama_base_url),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            ollama_embedding_model: lookup("OLLAMA_EMBEDDING_MODEL")
                .unwrap_or(defaults.ollama_embedding_model),
            documents_dir: lookup("RAG_DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.documents_dir),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            chunk_size: parse_or(&lookup, "RAG_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(&lookup, "RAG_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_or(&lookup, "RAG_TOP_K", defaults.top_k)?,
            similarity_threshold: parse_or(
                &lookup,
                "RAG_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            )?,
            memory_max_messages: parse_or(
                &lookup,
                "CHAT_MEMORY_MAX_MESSAGES",
                defaults.memory_max_messages,
            )?,
            cli_enabled: parse_or(&lookup, "APP_CLI_ENABLED", defaults.cli_enabled)?,
            cli_filter_expression: lookup("APP_CLI_FILTER_EXPRESSION").filter(|f| !f.trim().is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::invalid_config(key, format!("'{raw}': {e}"))),
    }
}
